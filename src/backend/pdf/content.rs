//! Content stream construction.
//!
//! Page content is gathered as a list of typed operations and rendered
//! to bytes in one pass. Only the operators this writer emits are
//! modeled; numbers use Rust's shortest float formatting, which PDF
//! readers accept.

use std::io::Write;

/// One content stream operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContentOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate transformation matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Select an extended graphics state (gs)
    SetExtGState(String),
    /// Set line width (w)
    SetLineWidth(f32),
    /// Set line cap style (J)
    SetLineCap(u8),
    /// Set line join style (j)
    SetLineJoin(u8),
    /// Set miter limit (M)
    SetMiterLimit(f32),
    /// Set dash pattern and phase (d)
    SetDash(Vec<f32>, f32),
    /// Set fill color RGB (rg)
    SetFillRgb(f32, f32, f32),
    /// Set stroke color RGB (RG)
    SetStrokeRgb(f32, f32, f32),
    /// Move to (m)
    MoveTo(f32, f32),
    /// Line to (l)
    LineTo(f32, f32),
    /// Curve to (c)
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle (re)
    Rectangle(f32, f32, f32, f32),
    /// Close subpath (h)
    ClosePath,
    /// Fill with non-zero winding (f)
    Fill,
    /// Fill with even-odd rule (f*)
    FillEvenOdd,
    /// Stroke (S)
    Stroke,
    /// Intersect clip, non-zero winding (W)
    Clip,
    /// Intersect clip, even-odd (W*)
    ClipEvenOdd,
    /// End path without painting (n)
    EndPath,
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(String, f32),
    /// Set text matrix (Tm)
    SetTextMatrix(f32, f32, f32, f32, f32, f32),
    /// Set text rendering mode (Tr); 3 draws nothing
    SetTextRenderMode(i32),
    /// Show text (Tj)
    ShowText(String),
    /// Paint a named XObject (Do)
    PaintXObject(String),
}

/// An in-progress content stream.
#[derive(Debug, Default)]
pub(crate) struct ContentStream {
    ops: Vec<ContentOp>,
}

impl ContentStream {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, op: ContentOp) {
        self.ops.push(op);
    }

    pub(crate) fn extend<I: IntoIterator<Item = ContentOp>>(&mut self, ops: I) {
        self.ops.extend(ops);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Render all operations, one per line.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for op in &self.ops {
            // Writing to a Vec cannot fail.
            write_op(&mut buf, op).unwrap();
            buf.push(b'\n');
        }
        buf
    }
}

fn write_op<W: Write>(w: &mut W, op: &ContentOp) -> std::io::Result<()> {
    match op {
        ContentOp::SaveState => write!(w, "q"),
        ContentOp::RestoreState => write!(w, "Q"),
        ContentOp::Transform(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} cm", a, b, c, d, e, f)
        },
        ContentOp::SetExtGState(name) => write!(w, "/{} gs", name),
        ContentOp::SetLineWidth(width) => write!(w, "{} w", width),
        ContentOp::SetLineCap(cap) => write!(w, "{} J", cap),
        ContentOp::SetLineJoin(join) => write!(w, "{} j", join),
        ContentOp::SetMiterLimit(limit) => write!(w, "{} M", limit),
        ContentOp::SetDash(pattern, phase) => {
            write!(w, "[")?;
            for (i, v) in pattern.iter().enumerate() {
                if i > 0 {
                    write!(w, " ")?;
                }
                write!(w, "{}", v)?;
            }
            write!(w, "] {} d", phase)
        },
        ContentOp::SetFillRgb(r, g, b) => write!(w, "{} {} {} rg", r, g, b),
        ContentOp::SetStrokeRgb(r, g, b) => write!(w, "{} {} {} RG", r, g, b),
        ContentOp::MoveTo(x, y) => write!(w, "{} {} m", x, y),
        ContentOp::LineTo(x, y) => write!(w, "{} {} l", x, y),
        ContentOp::CurveTo(x1, y1, x2, y2, x3, y3) => {
            write!(w, "{} {} {} {} {} {} c", x1, y1, x2, y2, x3, y3)
        },
        ContentOp::Rectangle(x, y, w_val, h) => write!(w, "{} {} {} {} re", x, y, w_val, h),
        ContentOp::ClosePath => write!(w, "h"),
        ContentOp::Fill => write!(w, "f"),
        ContentOp::FillEvenOdd => write!(w, "f*"),
        ContentOp::Stroke => write!(w, "S"),
        ContentOp::Clip => write!(w, "W"),
        ContentOp::ClipEvenOdd => write!(w, "W*"),
        ContentOp::EndPath => write!(w, "n"),
        ContentOp::BeginText => write!(w, "BT"),
        ContentOp::EndText => write!(w, "ET"),
        ContentOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, size),
        ContentOp::SetTextMatrix(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} Tm", a, b, c, d, e, f)
        },
        ContentOp::SetTextRenderMode(mode) => write!(w, "{} Tr", mode),
        ContentOp::ShowText(text) => {
            write!(w, "(")?;
            write_escaped(w, text)?;
            write!(w, ") Tj")
        },
        ContentOp::PaintXObject(name) => write!(w, "/{} Do", name),
    }
}

/// Escape a literal string body. Characters outside Latin-1 cannot be
/// represented with the built-in fonts and degrade to `?`.
fn write_escaped<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    for ch in text.chars() {
        match ch {
            '(' => write!(w, "\\(")?,
            ')' => write!(w, "\\)")?,
            '\\' => write!(w, "\\\\")?,
            '\n' => write!(w, "\\n")?,
            '\r' => write!(w, "\\r")?,
            '\t' => write!(w, "\\t")?,
            _ => {
                let code = ch as u32;
                if code < 0x100 {
                    w.write_all(&[code as u8])?;
                } else {
                    w.write_all(b"?")?;
                }
            },
        }
    }
    Ok(())
}
