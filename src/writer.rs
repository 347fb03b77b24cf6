//! The document writer.
//!
//! A writer is bound at creation to a sink, a format, and a validated
//! option string. Pages are produced one at a time: `begin_page` hands
//! out a [`PageRecorder`] scoped to a media box, `end_page` seals the
//! recording, runs the optional OCR stage, and streams the page
//! through the format backend. `close` writes trailing structures.
//!
//! Option validation happens before the sink is touched, so a bad
//! format or option string never creates an output file.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use serde::Serialize;

use crate::backend::{BackendConfig, FormatBackend};
use crate::device::PageRecorder;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::geometry::Rect;
use crate::ocr::{OcrOutcome, OcrStage, ProgressListener, TextRecognizer};
use crate::raster::{MAX_RESOLUTION, MIN_RESOLUTION};

/// A non-fatal problem recorded while writing, such as a failed OCR
/// pass. The affected page is still emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Zero-based index of the affected page
    pub page_index: usize,
    /// What went wrong
    pub message: String,
}

/// Writer lifecycle.
///
/// Protocol errors (`IllegalState`) leave the state unchanged so the
/// caller can correct course; sink and encoding errors poison the
/// writer instead, since partial output cannot be rolled back.
#[derive(Debug)]
enum State {
    Idle,
    PageOpen,
    Closed,
    Failed(String),
}

/// Multi-format, page-at-a-time document writer.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use pagepress::{Color, DocumentWriter, Format, Rect};
///
/// let mut writer = DocumentWriter::from_sink(Cursor::new(Vec::new()), Format::Pdf, "")?;
/// let page = writer.begin_page(Rect::new(0.0, 0.0, 595.0, 842.0))?;
/// page.fill_rect(Rect::new(72.0, 700.0, 300.0, 780.0), Color::rgb(0.9, 0.2, 0.2));
/// writer.end_page()?;
/// let pdf = writer.finish()?.into_inner();
/// assert!(pdf.starts_with(b"%PDF-"));
/// # Ok::<(), pagepress::Error>(())
/// ```
pub struct DocumentWriter<W: Write + Seek> {
    backend: Option<Box<dyn FormatBackend<W>>>,
    sink: Option<W>,
    format: Format,
    state: State,
    recorder: Option<PageRecorder>,
    ocr: Option<OcrStage>,
    pages_written: usize,
    warnings: Vec<Warning>,
}

impl DocumentWriter<BufWriter<File>> {
    /// Create a writer for a new file at `path`.
    ///
    /// The option string is validated first; if it is rejected, no
    /// file is created.
    pub fn create<P: AsRef<Path>>(path: P, format: Format, options: &str) -> Result<Self> {
        let config = BackendConfig::resolve(format, options)?;
        let file = File::create(path)?;
        Self::with_config(config, BufWriter::new(file))
    }
}

impl<W: Write + Seek + 'static> DocumentWriter<W> {
    /// Create a writer over an arbitrary seekable sink.
    pub fn from_sink(sink: W, format: Format, options: &str) -> Result<Self> {
        let config = BackendConfig::resolve(format, options)?;
        Self::with_config(config, sink)
    }

    fn with_config(config: BackendConfig, sink: W) -> Result<Self> {
        let format = config.format();
        let backend = config.into_backend(sink)?;
        log::debug!("created {} writer", format);
        Ok(Self {
            backend: Some(backend),
            sink: None,
            format,
            state: State::Idle,
            recorder: None,
            ocr: None,
            pages_written: 0,
            warnings: Vec::new(),
        })
    }

    /// The output format this writer produces.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of pages fully written so far.
    pub fn page_count(&self) -> usize {
        self.pages_written
    }

    /// Non-fatal problems recorded so far, in page order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Attach a text recognizer; finished pages will be OCRed before
    /// encoding. Must happen before the first page.
    pub fn set_ocr_engine(&mut self, engine: Box<dyn TextRecognizer>) -> Result<()> {
        self.check_before_first_page("an OCR engine")?;
        if self.ocr.is_some() {
            return Err(Error::illegal("an OCR engine is already attached"));
        }
        self.ocr = Some(OcrStage::new(engine));
        Ok(())
    }

    /// Attach a per-page progress listener for the OCR stage. Must
    /// happen before the first page, after an engine is attached.
    pub fn set_ocr_listener(&mut self, listener: ProgressListener) -> Result<()> {
        self.check_before_first_page("an OCR listener")?;
        match self.ocr.as_mut() {
            Some(stage) => {
                stage.set_listener(listener);
                Ok(())
            },
            None => Err(Error::illegal(
                "attach an OCR engine before setting a progress listener",
            )),
        }
    }

    /// Set the resolution the OCR stage rasterizes at, in dpi.
    pub fn set_ocr_resolution(&mut self, dpi: f32) -> Result<()> {
        self.check_before_first_page("the OCR resolution")?;
        if !dpi.is_finite() || !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&dpi) {
            return Err(Error::InvalidOption {
                key: "ocr-resolution".to_string(),
                reason: format!(
                    "{} is outside the allowed range {}..={}",
                    dpi, MIN_RESOLUTION, MAX_RESOLUTION
                ),
            });
        }
        match self.ocr.as_mut() {
            Some(stage) => {
                stage.set_resolution(dpi);
                Ok(())
            },
            None => Err(Error::illegal(
                "attach an OCR engine before setting the OCR resolution",
            )),
        }
    }

    fn check_before_first_page(&self, what: &str) -> Result<()> {
        match &self.state {
            State::Idle if self.pages_written == 0 => Ok(()),
            State::Failed(msg) => Err(Error::illegal(format!("writer already failed: {}", msg))),
            _ => Err(Error::illegal(format!(
                "{} must be attached before the first page",
                what
            ))),
        }
    }

    /// Start a new page covering `mediabox` and return its recorder.
    pub fn begin_page(&mut self, mediabox: Rect) -> Result<&mut PageRecorder> {
        match &self.state {
            State::PageOpen => Err(Error::illegal("begin_page called while a page is open")),
            State::Closed => Err(Error::illegal("begin_page called on a closed writer")),
            State::Failed(msg) => Err(Error::illegal(format!("writer already failed: {}", msg))),
            State::Idle => {
                if !mediabox.is_valid() {
                    return Err(Error::InvalidGeometry(mediabox));
                }
                log::debug!(
                    "begin page {} with media box {}",
                    self.pages_written + 1,
                    mediabox
                );
                self.state = State::PageOpen;
                Ok(self.recorder.insert(PageRecorder::new(mediabox)))
            },
        }
    }

    /// The recorder for the currently open page.
    pub fn recorder(&mut self) -> Result<&mut PageRecorder> {
        match self.recorder.as_mut() {
            Some(recorder) if matches!(self.state, State::PageOpen) => Ok(recorder),
            _ => Err(Error::illegal("no page is open")),
        }
    }

    /// Seal the open page, run OCR if attached, and stream the page to
    /// the sink.
    pub fn end_page(&mut self) -> Result<()> {
        match &self.state {
            State::Idle => return Err(Error::illegal("end_page called with no open page")),
            State::Closed => return Err(Error::illegal("end_page called on a closed writer")),
            State::Failed(msg) => {
                return Err(Error::illegal(format!("writer already failed: {}", msg)))
            },
            State::PageOpen => {},
        }
        let recorder = self
            .recorder
            .take()
            .ok_or_else(|| Error::illegal("no page is open"))?;
        let mut page = recorder.finish();

        if let Some(stage) = self.ocr.as_mut() {
            match stage.process(&mut page) {
                Ok(OcrOutcome::Completed(regions)) => {
                    log::debug!(
                        "ocr attached {} regions to page {}",
                        regions,
                        self.pages_written + 1
                    );
                },
                Ok(OcrOutcome::Cancelled) => {
                    self.warn("OCR cancelled by progress listener");
                },
                Err(e) => {
                    self.warn(format!("OCR failed, page written without text layer: {}", e));
                },
            }
        }

        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| Error::illegal("writer already closed"))?;
        match backend.append_page(&page) {
            Ok(()) => {
                self.pages_written += 1;
                self.state = State::Idle;
                Ok(())
            },
            Err(e) => {
                self.state = State::Failed(e.to_string());
                Err(e)
            },
        }
    }

    /// Write trailing structures and flush. Must be called exactly
    /// once, with no page open.
    pub fn close(&mut self) -> Result<()> {
        match &self.state {
            State::PageOpen => return Err(Error::illegal("close called while a page is open")),
            State::Closed => return Err(Error::illegal("close called twice")),
            State::Failed(msg) => {
                return Err(Error::illegal(format!("writer already failed: {}", msg)))
            },
            State::Idle => {},
        }
        let backend = self
            .backend
            .take()
            .ok_or_else(|| Error::illegal("writer already closed"))?;
        match backend.finalize() {
            Ok(sink) => {
                log::info!(
                    "closed {} document, {} pages, {} warnings",
                    self.format,
                    self.pages_written,
                    self.warnings.len()
                );
                self.sink = Some(sink);
                self.state = State::Closed;
                Ok(())
            },
            Err(e) => {
                self.state = State::Failed(e.to_string());
                Err(e)
            },
        }
    }

    /// Close the document if still open and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        if matches!(self.state, State::Idle) {
            self.close()?;
        }
        match &self.state {
            State::Closed => self
                .sink
                .take()
                .ok_or_else(|| Error::illegal("sink already taken")),
            State::PageOpen => Err(Error::illegal("finish called while a page is open")),
            State::Failed(msg) => Err(Error::illegal(format!("writer already failed: {}", msg))),
            State::Idle => Err(Error::illegal("writer not closed")),
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        let warning = Warning {
            page_index: self.pages_written,
            message: message.into(),
        };
        log::warn!("page {}: {}", warning.page_index, warning.message);
        self.warnings.push(warning);
    }
}

impl<W: Write + Seek> std::fmt::Debug for DocumentWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWriter")
            .field("format", &self.format)
            .field("state", &self.state)
            .field("pages_written", &self.pages_written)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Seek> Drop for DocumentWriter<W> {
    fn drop(&mut self) {
        if self.backend.is_some() && matches!(self.state, State::Idle | State::PageOpen) {
            log::warn!(
                "{} writer dropped without close, output is incomplete",
                self.format
            );
        }
    }
}
