//! Optional OCR stage.
//!
//! When a recognizer is attached to a writer, every finished page is
//! rasterized and run through it before encoding; recognized lines are
//! attached to the page as [`TextRegion`]s in page coordinates. The
//! PDF backend paints them as invisible text and the text backend
//! emits them as lines.
//!
//! Recognition failures never fail the document: the writer records a
//! warning and emits the page without a text overlay. A progress
//! listener can watch per-page progress and cancel recognition for the
//! current page by returning `false`.

#[cfg(feature = "ocr")]
pub mod ocrs_engine;

use crate::error::Result;
use crate::geometry::Rect;
use crate::page::{Page, TextRegion};
use crate::raster::{rasterize, rgb_bytes};

/// Per-page progress callback. Receives a percentage in `0..=100`;
/// returning `false` cancels recognition for the current page.
pub type ProgressListener = Box<dyn FnMut(u8) -> bool>;

/// Errors from a text recognizer.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Model files missing, unreadable, or incompatible
    #[error("OCR model error: {0}")]
    Model(String),
    /// The raster could not be prepared for recognition
    #[error("OCR input error: {0}")]
    Input(String),
    /// Detection or recognition failed
    #[error("OCR recognition failed: {0}")]
    Recognition(String),
}

/// One recognized line of text.
///
/// The bounding box is in raster pixels with y increasing downward, so
/// `y0` is the top edge of the line.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedLine {
    /// Recognized characters
    pub text: String,
    /// Line extent in pixel coordinates
    pub bbox: Rect,
}

/// A text recognition engine.
///
/// Implemented by [`ocrs_engine::OcrsRecognizer`] when the `ocr`
/// feature is enabled; callers can plug in their own engine as well.
pub trait TextRecognizer {
    /// Recognize text lines in a packed 8-bit RGB raster.
    fn recognize(
        &self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> std::result::Result<Vec<RecognizedLine>, OcrError>;
}

/// What happened to one page in the OCR stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OcrOutcome {
    /// Recognition ran to completion, attaching this many regions
    Completed(usize),
    /// The listener cancelled; the page carries no text overlay
    Cancelled,
}

/// The recognizer plus its listener and raster settings, owned by the
/// writer once attached.
pub(crate) struct OcrStage {
    engine: Box<dyn TextRecognizer>,
    listener: Option<ProgressListener>,
    resolution: f32,
}

impl OcrStage {
    /// Resolution recognition rasters use unless overridden.
    pub(crate) const DEFAULT_RESOLUTION: f32 = 300.0;

    pub(crate) fn new(engine: Box<dyn TextRecognizer>) -> Self {
        Self {
            engine,
            listener: None,
            resolution: Self::DEFAULT_RESOLUTION,
        }
    }

    pub(crate) fn set_listener(&mut self, listener: ProgressListener) {
        self.listener = Some(listener);
    }

    /// Set the recognition raster resolution. The writer validates the
    /// range before calling this.
    pub(crate) fn set_resolution(&mut self, dpi: f32) {
        self.resolution = dpi;
    }

    /// Rasterize a finished page, run recognition, and attach the
    /// results in page coordinates.
    pub(crate) fn process(&mut self, page: &mut Page) -> Result<OcrOutcome> {
        let mut progress = ProgressTracker::new(self.listener.as_deref_mut());
        if !progress.report(0) {
            return Ok(OcrOutcome::Cancelled);
        }

        let pixmap = rasterize(page, self.resolution)?;
        if !progress.report(30) {
            return Ok(OcrOutcome::Cancelled);
        }

        let rgb = rgb_bytes(&pixmap);
        let lines = self
            .engine
            .recognize(&rgb, pixmap.width(), pixmap.height())
            .map_err(|e| crate::error::Error::encode("ocr", e.to_string()))?;
        if !progress.report(70) {
            return Ok(OcrOutcome::Cancelled);
        }

        // Pixel boxes are top-down from the page's top-left corner;
        // page space is bottom-up from the media box origin.
        let scale = self.resolution / 72.0;
        let mediabox = page.mediabox;
        let mut attached = 0;
        for line in lines {
            if line.text.trim().is_empty() {
                continue;
            }
            let bbox = Rect::new(
                mediabox.x0 + line.bbox.x0 / scale,
                mediabox.y1 - line.bbox.y1 / scale,
                mediabox.x0 + line.bbox.x1 / scale,
                mediabox.y1 - line.bbox.y0 / scale,
            );
            if !bbox.is_valid() {
                continue;
            }
            page.ocr_text.push(TextRegion { text: line.text, bbox });
            attached += 1;
        }

        progress.report(100);
        Ok(OcrOutcome::Completed(attached))
    }
}

/// Keeps reported percentages clamped, monotonic, and silent after a
/// cancel.
struct ProgressTracker<'a, 'b> {
    listener: Option<&'a mut (dyn FnMut(u8) -> bool + 'b)>,
    last: Option<u8>,
    cancelled: bool,
}

impl<'a, 'b> ProgressTracker<'a, 'b> {
    fn new(listener: Option<&'a mut (dyn FnMut(u8) -> bool + 'b)>) -> Self {
        Self {
            listener,
            last: None,
            cancelled: false,
        }
    }

    /// Report progress; returns `false` once cancelled.
    fn report(&mut self, percent: u8) -> bool {
        if self.cancelled {
            return false;
        }
        let mut percent = percent.min(100);
        if let Some(last) = self.last {
            percent = percent.max(last);
        }
        self.last = Some(percent);
        if let Some(listener) = self.listener.as_mut() {
            if !(listener)(percent) {
                self.cancelled = true;
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Returns a fixed script of lines regardless of input.
    struct Scripted(Vec<RecognizedLine>);

    impl TextRecognizer for Scripted {
        fn recognize(
            &self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> std::result::Result<Vec<RecognizedLine>, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl TextRecognizer for Failing {
        fn recognize(
            &self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> std::result::Result<Vec<RecognizedLine>, OcrError> {
            Err(OcrError::Recognition("model exploded".to_string()))
        }
    }

    fn page_100x100() -> Page {
        Page::new(Rect::new(0.0, 0.0, 100.0, 100.0), Vec::new())
    }

    #[test]
    fn test_progress_is_clamped_and_monotonic() {
        let mut seen = Vec::new();
        let mut listener = |p: u8| {
            seen.push(p);
            true
        };
        let mut tracker = ProgressTracker::new(Some(&mut listener));
        assert!(tracker.report(30));
        assert!(tracker.report(20));
        assert!(tracker.report(150));
        assert!(tracker.report(80));
        assert_eq!(seen, vec![30, 30, 100, 100]);
    }

    #[test]
    fn test_cancel_latches() {
        let mut calls = 0;
        let mut listener = |_p: u8| {
            calls += 1;
            false
        };
        let mut tracker = ProgressTracker::new(Some(&mut listener));
        assert!(!tracker.report(10));
        assert!(!tracker.report(50));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_regions_mapped_to_page_space() {
        let mut stage = OcrStage::new(Box::new(Scripted(vec![RecognizedLine {
            text: "hello".to_string(),
            // At 72 dpi one pixel is one point.
            bbox: Rect::new(10.0, 10.0, 50.0, 20.0),
        }])));
        stage.set_resolution(72.0);

        let mut page = page_100x100();
        let outcome = stage.process(&mut page).unwrap();
        assert_eq!(outcome, OcrOutcome::Completed(1));
        assert_eq!(page.ocr_text.len(), 1);
        let region = &page.ocr_text[0];
        assert_eq!(region.text, "hello");
        // Pixel top y=10 is page y=90; pixel bottom y=20 is page y=80.
        assert_eq!(region.bbox, Rect::new(10.0, 80.0, 50.0, 90.0));
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let mut stage = OcrStage::new(Box::new(Scripted(vec![
            RecognizedLine {
                text: "  ".to_string(),
                bbox: Rect::new(0.0, 0.0, 10.0, 5.0),
            },
            RecognizedLine {
                text: "kept".to_string(),
                bbox: Rect::new(0.0, 10.0, 10.0, 15.0),
            },
        ])));
        stage.set_resolution(72.0);
        let mut page = page_100x100();
        assert_eq!(stage.process(&mut page).unwrap(), OcrOutcome::Completed(1));
        assert_eq!(page.ocr_text[0].text, "kept");
    }

    #[test]
    fn test_listener_sees_full_sweep() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_inner = Rc::clone(&seen);
        let mut stage = OcrStage::new(Box::new(Scripted(Vec::new())));
        stage.set_resolution(72.0);
        stage.set_listener(Box::new(move |p| {
            seen_inner.borrow_mut().push(p);
            true
        }));
        let mut page = page_100x100();
        stage.process(&mut page).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 30, 70, 100]);
    }

    #[test]
    fn test_cancel_skips_recognition() {
        let mut stage = OcrStage::new(Box::new(Scripted(vec![RecognizedLine {
            text: "never attached".to_string(),
            bbox: Rect::new(0.0, 0.0, 10.0, 5.0),
        }])));
        stage.set_resolution(72.0);
        stage.set_listener(Box::new(|p| p < 30));
        let mut page = page_100x100();
        assert_eq!(stage.process(&mut page).unwrap(), OcrOutcome::Cancelled);
        assert!(page.ocr_text.is_empty());
    }

    #[test]
    fn test_cancellation_resets_between_pages() {
        let pages = Rc::new(RefCell::new(0u8));
        let pages_inner = Rc::clone(&pages);
        let mut stage = OcrStage::new(Box::new(Scripted(Vec::new())));
        stage.set_resolution(72.0);
        // Cancel only while processing the first page.
        stage.set_listener(Box::new(move |_| *pages_inner.borrow() > 0));

        let mut first = page_100x100();
        assert_eq!(stage.process(&mut first).unwrap(), OcrOutcome::Cancelled);
        *pages.borrow_mut() = 1;
        let mut second = page_100x100();
        assert_eq!(stage.process(&mut second).unwrap(), OcrOutcome::Completed(0));
    }

    #[test]
    fn test_engine_failure_is_an_error() {
        let mut stage = OcrStage::new(Box::new(Failing));
        stage.set_resolution(72.0);
        let mut page = page_100x100();
        let err = stage.process(&mut page).unwrap_err();
        assert!(err.to_string().contains("model exploded"));
        assert!(page.ocr_text.is_empty());
    }
}
