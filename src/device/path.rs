//! Vector path data recorded by the page device.
//!
//! A [`PathData`] is an ordered list of subpath operations in page space.
//! Backends translate it to PDF path operators or rasterize it directly.

use crate::geometry::Rect;

/// A vector path built from move/line/curve segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    /// Path operations, in order
    pub ops: Vec<PathOp>,
}

impl PathData {
    /// Create a new empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path from a list of operations.
    pub fn from_ops(ops: Vec<PathOp>) -> Self {
        Self { ops }
    }

    /// Append an operation.
    pub fn push(&mut self, op: PathOp) {
        self.ops.push(op);
    }

    /// Start a new subpath at the given point.
    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.ops.push(PathOp::MoveTo(x, y));
        self
    }

    /// Draw a line to the given point.
    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.ops.push(PathOp::LineTo(x, y));
        self
    }

    /// Draw a cubic Bezier curve to `(x3, y3)` with the given control points.
    pub fn curve_to(mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> Self {
        self.ops.push(PathOp::CurveTo(x1, y1, x2, y2, x3, y3));
        self
    }

    /// Close the current subpath.
    pub fn close(mut self) -> Self {
        self.ops.push(PathOp::ClosePath);
        self
    }

    /// Whether the path contains no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    // === Convenience constructors ===

    /// Create a single-segment line path.
    pub fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::from_ops(vec![PathOp::MoveTo(x1, y1), PathOp::LineTo(x2, y2)])
    }

    /// Create a rectangle path.
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_ops(vec![PathOp::Rectangle(x, y, width, height)])
    }

    /// Create an approximate circle path from four cubic Bezier curves.
    pub fn circle(cx: f32, cy: f32, radius: f32) -> Self {
        // Magic constant for approximating a quarter circle with a cubic Bezier
        // k = 4 * (sqrt(2) - 1) / 3 ≈ 0.5522847498
        const K: f32 = 0.552_284_8;
        let k = radius * K;

        Self::from_ops(vec![
            PathOp::MoveTo(cx, cy + radius),
            PathOp::CurveTo(cx + k, cy + radius, cx + radius, cy + k, cx + radius, cy),
            PathOp::CurveTo(cx + radius, cy - k, cx + k, cy - radius, cx, cy - radius),
            PathOp::CurveTo(cx - k, cy - radius, cx - radius, cy - k, cx - radius, cy),
            PathOp::CurveTo(cx - radius, cy + k, cx - k, cy + radius, cx, cy + radius),
            PathOp::ClosePath,
        ])
    }

    /// Compute the bounding box of all path points.
    ///
    /// Bezier control points are included, so the box may be slightly
    /// larger than the painted extent. Empty paths yield a zero rect.
    pub fn bounds(&self) -> Rect {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;

        let mut extend = |x: f32, y: f32| {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        };

        for op in &self.ops {
            match op {
                PathOp::MoveTo(x, y) | PathOp::LineTo(x, y) => extend(*x, *y),
                PathOp::CurveTo(x1, y1, x2, y2, x3, y3) => {
                    extend(*x1, *y1);
                    extend(*x2, *y2);
                    extend(*x3, *y3);
                },
                PathOp::Rectangle(x, y, w, h) => {
                    extend(*x, *y);
                    extend(*x + *w, *y + *h);
                },
                PathOp::ClosePath => {},
            }
        }

        if min_x == f32::MAX {
            Rect::new(0.0, 0.0, 0.0, 0.0)
        } else {
            Rect::new(min_x, min_y, max_x, max_y)
        }
    }
}

/// A single path operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    /// Move to a point (m operator)
    MoveTo(f32, f32),
    /// Line to a point (l operator)
    LineTo(f32, f32),
    /// Bezier curve to a point (c operator)
    /// (control1_x, control1_y, control2_x, control2_y, end_x, end_y)
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle (re operator)
    /// (x, y, width, height)
    Rectangle(f32, f32, f32, f32),
    /// Close the current subpath (h operator)
    ClosePath,
}

/// Line cap style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Butt cap - line ends exactly at endpoint
    #[default]
    Butt = 0,
    /// Round cap - semicircle at endpoint
    Round = 1,
    /// Square cap - half square at endpoint
    Square = 2,
}

/// Line join style for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    /// Miter join - sharp corner
    #[default]
    Miter = 0,
    /// Round join - circular arc
    Round = 1,
    /// Bevel join - diagonal corner
    Bevel = 2,
}

/// Stroke parameters for path stroking.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Line width in points
    pub width: f32,
    /// Line cap style
    pub cap: LineCap,
    /// Line join style
    pub join: LineJoin,
    /// Miter limit
    pub miter_limit: f32,
    /// Dash lengths (empty for a solid line)
    pub dash: Vec<f32>,
    /// Starting offset into the dash pattern
    pub dash_phase: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: Vec::new(),
            dash_phase: 0.0,
        }
    }
}

impl StrokeStyle {
    /// Create a solid stroke with the given width and default caps/joins.
    pub fn with_width(width: f32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}
