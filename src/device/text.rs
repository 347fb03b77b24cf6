//! Text runs recorded by the page device.
//!
//! A run is a string placed at a baseline origin in a named font. Font
//! outlines are not part of this crate; runs carry a base-14 font name
//! that format backends resolve themselves (the PDF backend declares a
//! matching Type1 font, the raster backends skip runs).

use crate::geometry::Point;

/// Reference to a standard base-14 font at a given size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontRef {
    /// PostScript name, e.g. "Helvetica" or "Times-Roman"
    pub name: String,
    /// Font size in points
    pub size: f32,
}

impl FontRef {
    /// Create a font reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::device::FontRef;
    ///
    /// let font = FontRef::new("Helvetica", 12.0);
    /// assert_eq!(font.name, "Helvetica");
    /// assert_eq!(font.size, 12.0);
    /// ```
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Helvetica at the given size.
    pub fn helvetica(size: f32) -> Self {
        Self::new("Helvetica", size)
    }
}

/// A single run of text at a baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// The text content
    pub text: String,
    /// Font and size
    pub font: FontRef,
    /// Baseline origin of the first glyph, in page space
    pub origin: Point,
}

impl TextRun {
    /// Create a text run.
    pub fn new(text: impl Into<String>, font: FontRef, origin: Point) -> Self {
        Self {
            text: text.into(),
            font,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_ref() {
        let font = FontRef::helvetica(10.5);
        assert_eq!(font.name, "Helvetica");
        assert_eq!(font.size, 10.5);
    }

    #[test]
    fn test_text_run() {
        let run = TextRun::new("hello", FontRef::new("Courier", 9.0), Point::new(72.0, 720.0));
        assert_eq!(run.text, "hello");
        assert_eq!(run.font.name, "Courier");
        assert_eq!(run.origin.y, 720.0);
    }
}
