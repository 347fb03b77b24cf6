//! The per-page drawing device.
//!
//! A [`PageRecorder`] is handed out by `DocumentWriter::begin_page` and
//! collects drawing commands for exactly one page. It only records;
//! nothing is encoded until end-of-page, when the writer passes the
//! finished command list to the format backend.
//!
//! Clip and transparency-group nesting is tracked while recording:
//! mismatched pops are ignored with a debug log, and anything left open
//! at end-of-page is closed implicitly so backends always see balanced
//! pairs.

pub mod image;
pub mod path;
pub mod text;

pub use image::{ColorSpace, ImageData, ImageEncoding, ImageError};
pub use path::{LineCap, LineJoin, PathData, PathOp, StrokeStyle};
pub use text::{FontRef, TextRun};

use crate::geometry::{Point, Rect};
use crate::page::Page;

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
}

impl Color {
    /// Create a color from RGB components.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create a gray color.
    pub fn gray(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Black.
    pub fn black() -> Self {
        Self::gray(0.0)
    }

    /// White.
    pub fn white() -> Self {
        Self::gray(1.0)
    }

    /// Perceptual luminance (BT.601 weights), used for gray output.
    pub fn luma(&self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Winding rule for fills and clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Non-zero winding rule
    #[default]
    NonZero,
    /// Even-odd rule
    EvenOdd,
}

/// A recorded drawing command.
#[derive(Debug, Clone)]
pub enum PageCommand {
    /// Fill a path with a solid color
    FillPath {
        /// The path to fill
        path: PathData,
        /// Winding rule
        rule: FillRule,
        /// Fill color
        color: Color,
        /// Constant alpha in 0.0..=1.0
        alpha: f32,
    },
    /// Stroke a path with a solid color
    StrokePath {
        /// The path to stroke
        path: PathData,
        /// Stroke parameters
        style: StrokeStyle,
        /// Stroke color
        color: Color,
        /// Constant alpha in 0.0..=1.0
        alpha: f32,
    },
    /// Push a clip: subsequent painting is restricted to the path
    ClipPath {
        /// The clip path
        path: PathData,
        /// Winding rule
        rule: FillRule,
    },
    /// Pop the most recent clip
    PopClip,
    /// Paint a text run
    FillText {
        /// The run to paint
        run: TextRun,
        /// Text color
        color: Color,
        /// Constant alpha in 0.0..=1.0
        alpha: f32,
    },
    /// Place an image into a rectangle
    DrawImage {
        /// The image to place
        image: ImageData,
        /// Destination rectangle in page space
        rect: Rect,
        /// Constant alpha in 0.0..=1.0
        alpha: f32,
    },
    /// Open a transparency group
    PushGroup {
        /// Group alpha applied to everything inside
        alpha: f32,
        /// Isolated group flag (recorded, not rendered specially)
        isolated: bool,
        /// Knockout group flag (recorded, not rendered specially)
        knockout: bool,
    },
    /// Close the most recent transparency group
    PopGroup,
}

/// What kind of nesting a push opened, for balanced unwinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Clip,
    Group,
}

/// Drawing-command sink for a single page.
///
/// Obtained from `DocumentWriter::begin_page`; the mutable borrow ties
/// the recorder's lifetime to the writer, so a device cannot outlive
/// its page.
#[derive(Debug)]
pub struct PageRecorder {
    mediabox: Rect,
    commands: Vec<PageCommand>,
    nesting: Vec<Nesting>,
}

impl PageRecorder {
    pub(crate) fn new(mediabox: Rect) -> Self {
        Self {
            mediabox,
            commands: Vec::new(),
            nesting: Vec::new(),
        }
    }

    /// The media box this page was opened with.
    pub fn mediabox(&self) -> Rect {
        self.mediabox
    }

    /// The commands recorded so far.
    pub fn commands(&self) -> &[PageCommand] {
        &self.commands
    }

    /// Fill a path.
    pub fn fill_path(
        &mut self,
        path: PathData,
        rule: FillRule,
        color: Color,
        alpha: f32,
    ) -> &mut Self {
        self.commands.push(PageCommand::FillPath {
            path,
            rule,
            color,
            alpha: alpha.clamp(0.0, 1.0),
        });
        self
    }

    /// Stroke a path.
    pub fn stroke_path(
        &mut self,
        path: PathData,
        style: StrokeStyle,
        color: Color,
        alpha: f32,
    ) -> &mut Self {
        self.commands.push(PageCommand::StrokePath {
            path,
            style,
            color,
            alpha: alpha.clamp(0.0, 1.0),
        });
        self
    }

    /// Push a clip path. Painting until the matching [`pop_clip`] is
    /// restricted to the path's interior.
    ///
    /// [`pop_clip`]: Self::pop_clip
    pub fn clip_path(&mut self, path: PathData, rule: FillRule) -> &mut Self {
        self.commands.push(PageCommand::ClipPath { path, rule });
        self.nesting.push(Nesting::Clip);
        self
    }

    /// Pop the most recent clip.
    pub fn pop_clip(&mut self) -> &mut Self {
        match self.nesting.last() {
            Some(Nesting::Clip) => {
                self.nesting.pop();
                self.commands.push(PageCommand::PopClip);
            },
            _ => log::debug!("pop_clip without a matching clip_path, ignored"),
        }
        self
    }

    /// Paint a text run.
    pub fn fill_text(&mut self, run: TextRun, color: Color, alpha: f32) -> &mut Self {
        self.commands.push(PageCommand::FillText {
            run,
            color,
            alpha: alpha.clamp(0.0, 1.0),
        });
        self
    }

    /// Place an image into the given rectangle.
    pub fn draw_image(&mut self, image: ImageData, rect: Rect, alpha: f32) -> &mut Self {
        self.commands.push(PageCommand::DrawImage {
            image,
            rect,
            alpha: alpha.clamp(0.0, 1.0),
        });
        self
    }

    /// Open a transparency group with the given alpha.
    pub fn push_group(&mut self, alpha: f32, isolated: bool, knockout: bool) -> &mut Self {
        self.commands.push(PageCommand::PushGroup {
            alpha: alpha.clamp(0.0, 1.0),
            isolated,
            knockout,
        });
        self.nesting.push(Nesting::Group);
        self
    }

    /// Close the most recent transparency group.
    pub fn pop_group(&mut self) -> &mut Self {
        match self.nesting.last() {
            Some(Nesting::Group) => {
                self.nesting.pop();
                self.commands.push(PageCommand::PopGroup);
            },
            _ => log::debug!("pop_group without a matching push_group, ignored"),
        }
        self
    }

    // === Convenience helpers ===

    /// Fill an axis-aligned rectangle with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> &mut Self {
        let path = PathData::rect(rect.x0, rect.y0, rect.width(), rect.height());
        self.fill_path(path, FillRule::NonZero, color, 1.0)
    }

    /// Paint black text at a baseline position.
    pub fn add_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_name: &str,
        size: f32,
    ) -> &mut Self {
        let run = TextRun::new(text, FontRef::new(font_name, size), Point::new(x, y));
        self.fill_text(run, Color::black(), 1.0)
    }

    /// Seal the page: close any open clips/groups and hand the command
    /// list over for encoding.
    pub(crate) fn finish(mut self) -> Page {
        while let Some(nesting) = self.nesting.pop() {
            match nesting {
                Nesting::Clip => self.commands.push(PageCommand::PopClip),
                Nesting::Group => self.commands.push(PageCommand::PopGroup),
            }
        }
        Page::new(self.mediabox, self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fill_and_text() {
        let mut rec = PageRecorder::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        rec.fill_rect(Rect::new(10.0, 10.0, 50.0, 50.0), Color::rgb(1.0, 0.0, 0.0))
            .add_text("hi", 20.0, 80.0, "Helvetica", 12.0);

        assert_eq!(rec.commands().len(), 2);
        assert!(matches!(rec.commands()[0], PageCommand::FillPath { .. }));
        assert!(matches!(rec.commands()[1], PageCommand::FillText { .. }));
    }

    #[test]
    fn test_alpha_is_clamped() {
        let mut rec = PageRecorder::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        rec.fill_path(PathData::rect(0.0, 0.0, 10.0, 10.0), FillRule::NonZero, Color::black(), 3.5);

        match &rec.commands()[0] {
            PageCommand::FillPath { alpha, .. } => assert_eq!(*alpha, 1.0),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_clip_closed_at_finish() {
        let mut rec = PageRecorder::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        rec.clip_path(PathData::rect(0.0, 0.0, 50.0, 50.0), FillRule::NonZero);
        rec.push_group(0.5, false, false);

        let page = rec.finish();
        // Group closed first (innermost), then the clip
        let n = page.commands.len();
        assert!(matches!(page.commands[n - 2], PageCommand::PopGroup));
        assert!(matches!(page.commands[n - 1], PageCommand::PopClip));
    }

    #[test]
    fn test_mismatched_pop_is_ignored() {
        let mut rec = PageRecorder::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        rec.clip_path(PathData::rect(0.0, 0.0, 50.0, 50.0), FillRule::NonZero);
        // Wrong pop kind: the clip is still open
        rec.pop_group();
        assert_eq!(rec.commands().len(), 1);

        rec.pop_clip();
        assert_eq!(rec.commands().len(), 2);
        assert!(matches!(rec.commands()[1], PageCommand::PopClip));
    }

    #[test]
    fn test_color_luma() {
        assert_eq!(Color::white().luma(), 1.0);
        assert_eq!(Color::black().luma(), 0.0);
        let red = Color::rgb(1.0, 0.0, 0.0);
        assert!((red.luma() - 0.299).abs() < 1e-6);
    }
}
