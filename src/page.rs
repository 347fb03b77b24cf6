//! A finished page, between the device and the format backend.

use serde::Serialize;

use crate::device::PageCommand;
use crate::geometry::Rect;

/// One page's worth of content, ready to be encoded.
///
/// Produced when a page's recorder is sealed at end-of-page, consumed
/// by the format backend, then discarded. Pages never accumulate in the
/// writer.
#[derive(Debug)]
pub struct Page {
    /// The page's media box
    pub mediabox: Rect,
    /// Drawing commands in the order they were recorded
    pub commands: Vec<PageCommand>,
    /// Recognized text overlay, filled in by the OCR stage when active
    pub ocr_text: Vec<TextRegion>,
}

impl Page {
    pub(crate) fn new(mediabox: Rect, commands: Vec<PageCommand>) -> Self {
        Self {
            mediabox,
            commands,
            ocr_text: Vec::new(),
        }
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.mediabox.width()
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.mediabox.height()
    }
}

/// A region of recognized text in page space.
///
/// Attached to a page by the OCR stage; the PDF backend renders regions
/// as invisible text over the visible content, the text backend emits
/// them alongside ordinary runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRegion {
    /// The recognized text
    pub text: String,
    /// Bounding box in page space
    pub bbox: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_dimensions() {
        let page = Page::new(Rect::new(10.0, 20.0, 210.0, 320.0), Vec::new());
        assert_eq!(page.width(), 200.0);
        assert_eq!(page.height(), 300.0);
        assert!(page.ocr_text.is_empty());
    }

    #[test]
    fn test_text_region_serializes() {
        let region = TextRegion {
            text: "hello".to_string(),
            bbox: Rect::new(0.0, 0.0, 40.0, 10.0),
        };
        let json = serde_json::to_string(&region).unwrap();
        assert!(json.contains("\"hello\""));
        assert!(json.contains("\"x1\":40.0"));
    }
}
