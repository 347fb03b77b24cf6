//! Recognizer backed by the `ocrs` engine.
//!
//! `ocrs` is a pure-Rust OCR stack running neural models through
//! `rten`. It needs two model files:
//!
//! - `text-detection.rten` locates text regions
//! - `text-recognition.rten` decodes characters
//!
//! Both can be fetched once with the `ocrs-cli` tool, which caches
//! them under `$XDG_CACHE_HOME/ocrs` (usually `~/.cache/ocrs`), or
//! downloaded from the ocrs-models releases page.
//!
//! Model loading is the expensive step; build one recognizer and reuse
//! it across documents. Debug builds of `rten` are drastically slower,
//! so run OCR in release mode.

use std::path::{Path, PathBuf};

use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;

use super::{OcrError, RecognizedLine, TextRecognizer};
use crate::geometry::Rect;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Model cache directory per the XDG Base Directory spec.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Path to the text-detection model (`.rten`)
    pub detection: PathBuf,
    /// Path to the text-recognition model (`.rten`)
    pub recognition: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::in_dir(default_model_dir())
    }
}

impl ModelPaths {
    /// Point at a directory holding both models under their well-known
    /// names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    fn validate(&self) -> Result<(), OcrError> {
        for path in [&self.detection, &self.recognition] {
            if !path.exists() {
                return Err(OcrError::Model(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// A [`TextRecognizer`] running the `ocrs` pipeline.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load models from explicit paths.
    pub fn new(paths: &ModelPaths) -> Result<Self, OcrError> {
        paths.validate()?;

        log::info!("loading OCR models from {}", paths.detection.display());
        let detection_model = Model::load_file(&paths.detection).map_err(|e| {
            OcrError::Model(format!(
                "failed to load detection model from {}: {}",
                paths.detection.display(),
                e
            ))
        })?;
        let recognition_model = Model::load_file(&paths.recognition).map_err(|e| {
            OcrError::Model(format!(
                "failed to load recognition model from {}: {}",
                paths.recognition.display(),
                e
            ))
        })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::Model(format!("failed to initialise OCR engine: {}", e)))?;

        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_cached_models() -> Result<Self, OcrError> {
        Self::new(&ModelPaths::default())
    }

    /// Whether both model files are present in the default cache.
    pub fn models_cached() -> bool {
        let paths = ModelPaths::default();
        paths.detection.exists() && paths.recognition.exists()
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(
        &self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<RecognizedLine>, OcrError> {
        let source = ImageSource::from_bytes(rgb, (width, height)).map_err(|e| {
            OcrError::Input(format!("bad raster input ({}x{}): {}", width, height, e))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| OcrError::Input(format!("OCR preprocessing failed: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|e| OcrError::Recognition(format!("word detection failed: {}", e)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| OcrError::Recognition(format!("line recognition failed: {}", e)))?;

        let mut lines = Vec::with_capacity(line_texts.len());
        for line in line_texts.into_iter().flatten() {
            let text = line.to_string();
            if text.trim().is_empty() {
                continue;
            }
            let corners = line.rotated_rect().corners();
            let mut x0 = f32::INFINITY;
            let mut y0 = f32::INFINITY;
            let mut x1 = f32::NEG_INFINITY;
            let mut y1 = f32::NEG_INFINITY;
            for corner in corners {
                x0 = x0.min(corner.x);
                y0 = y0.min(corner.y);
                x1 = x1.max(corner.x);
                y1 = y1.max(corner.y);
            }
            lines.push(RecognizedLine {
                text,
                bbox: Rect::new(x0, y0, x1, y1),
            });
        }
        log::debug!("ocrs recognized {} lines", lines.len());
        Ok(lines)
    }
}
