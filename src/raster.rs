//! Page rasterization.
//!
//! Shared by the image-based backends (CBZ, PNM) and the OCR stage.
//! Pages are replayed onto a [`tiny_skia::Pixmap`] over an opaque white
//! background, with the page's bottom-up coordinate space flipped to
//! the pixmap's top-down one.
//!
//! Text runs are not rasterized; they are carried through to the
//! vector and text backends instead. Transparency groups are
//! approximated by multiplying the group alpha into every command
//! drawn inside the group.

use tiny_skia::{
    FillRule as SkFillRule, LineCap as SkLineCap, LineJoin as SkLineJoin, Mask, Paint, PathBuilder,
    Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};

use crate::device::{Color, FillRule, LineCap, LineJoin, PageCommand, PathData, PathOp, StrokeStyle};
use crate::error::{Error, Result};
use crate::options::{parse_f32_in, OptionsMap};
use crate::page::Page;

/// Lowest raster resolution accepted, in dots per inch.
pub const MIN_RESOLUTION: f32 = 18.0;
/// Highest raster resolution accepted, in dots per inch.
pub const MAX_RESOLUTION: f32 = 2400.0;
/// Resolution used when none is given.
pub const DEFAULT_RESOLUTION: f32 = 96.0;

/// Rasterization settings shared by the CBZ and PNM backends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output resolution in dots per inch.
    pub resolution: f32,
    /// Emit grayscale instead of RGB.
    pub gray: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            gray: false,
        }
    }
}

impl RasterOptions {
    /// Read the `resolution` and `colorspace` keys from a parsed
    /// option map. Unrelated keys are left for the caller to validate.
    pub(crate) fn from_options(opts: &OptionsMap) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(value) = opts.get("resolution") {
            settings.resolution = parse_f32_in("resolution", value, MIN_RESOLUTION, MAX_RESOLUTION)?;
        }
        if let Some(value) = opts.get("colorspace") {
            settings.gray = match value {
                "gray" | "grey" | "grayscale" => true,
                "rgb" | "color" | "colour" => false,
                other => {
                    return Err(Error::InvalidOption {
                        key: "colorspace".to_string(),
                        reason: format!("expected rgb or gray, found '{}'", other),
                    })
                },
            };
        }
        Ok(settings)
    }
}

/// Pixel dimensions of a page at the given resolution.
pub(crate) fn pixel_size(page: &Page, resolution: f32) -> (u32, u32) {
    let scale = resolution / 72.0;
    let width = (page.width() * scale).ceil().max(1.0) as u32;
    let height = (page.height() * scale).ceil().max(1.0) as u32;
    (width, height)
}

/// Replay a recorded page onto a white pixmap at `resolution` dpi.
pub(crate) fn rasterize(page: &Page, resolution: f32) -> Result<Pixmap> {
    let (width, height) = pixel_size(page, resolution);
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        Error::encode(
            "raster",
            format!("page too large to rasterize at {} dpi ({}x{} px)", resolution, width, height),
        )
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    // Page space is bottom-up with an arbitrary origin; pixels are
    // top-down from (0, 0). Flip y and shift the media box corner.
    let scale = resolution / 72.0;
    let mediabox = page.mediabox;
    let to_pixels = Transform::from_row(
        scale,
        0.0,
        0.0,
        -scale,
        -mediabox.x0 * scale,
        mediabox.y1 * scale,
    );

    let mut clips: Vec<Mask> = Vec::new();
    let mut group_alphas: Vec<f32> = Vec::new();

    for command in &page.commands {
        let group_alpha: f32 = group_alphas.iter().product();
        match command {
            PageCommand::FillPath { path, rule, color, alpha } => {
                if let Some(sk_path) = build_path(path) {
                    let paint = make_paint(*color, alpha * group_alpha);
                    pixmap.fill_path(&sk_path, &paint, fill_rule(*rule), to_pixels, clips.last());
                }
            },
            PageCommand::StrokePath { path, style, color, alpha } => {
                if let Some(sk_path) = build_path(path) {
                    let paint = make_paint(*color, alpha * group_alpha);
                    let stroke = make_stroke(style, scale);
                    pixmap.stroke_path(&sk_path, &paint, &stroke, to_pixels, clips.last());
                }
            },
            PageCommand::ClipPath { path, rule } => {
                let mask = match build_path(path) {
                    Some(sk_path) => match clips.last() {
                        Some(current) => {
                            let mut mask = current.clone();
                            mask.intersect_path(&sk_path, fill_rule(*rule), true, to_pixels);
                            mask
                        },
                        None => {
                            let mut mask = match Mask::new(width, height) {
                                Some(mask) => mask,
                                None => continue,
                            };
                            mask.fill_path(&sk_path, fill_rule(*rule), true, to_pixels);
                            mask
                        },
                    },
                    // An empty clip path clips everything away.
                    None => match Mask::new(width, height) {
                        Some(mask) => mask,
                        None => continue,
                    },
                };
                clips.push(mask);
            },
            PageCommand::PopClip => {
                clips.pop();
            },
            PageCommand::FillText { .. } => {
                // No glyph rendering; text reaches the PDF and text
                // backends through the recorded runs instead.
            },
            PageCommand::DrawImage { image, rect, alpha } => {
                draw_image(
                    &mut pixmap,
                    image,
                    rect,
                    alpha * group_alpha,
                    to_pixels,
                    clips.last(),
                )?;
            },
            PageCommand::PushGroup { alpha, .. } => {
                group_alphas.push(*alpha);
            },
            PageCommand::PopGroup => {
                group_alphas.pop();
            },
        }
    }

    Ok(pixmap)
}

/// Extract packed 8-bit RGB rows from a rendered pixmap.
pub(crate) fn rgb_bytes(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len() * 3);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.push(c.red());
        out.push(c.green());
        out.push(c.blue());
    }
    out
}

/// Extract 8-bit luma rows (BT.601 weights) from a rendered pixmap.
pub(crate) fn gray_bytes(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        let luma =
            0.299 * f32::from(c.red()) + 0.587 * f32::from(c.green()) + 0.114 * f32::from(c.blue());
        out.push(luma.round().clamp(0.0, 255.0) as u8);
    }
    out
}

/// Encode a rendered pixmap as PNG, either RGB or grayscale.
pub(crate) fn encode_png(pixmap: &Pixmap, gray: bool) -> Result<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::{ColorType, ImageEncoder};

    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    let result = if gray {
        encoder.write_image(&gray_bytes(pixmap), pixmap.width(), pixmap.height(), ColorType::L8)
    } else {
        encoder.write_image(&rgb_bytes(pixmap), pixmap.width(), pixmap.height(), ColorType::Rgb8)
    };
    result.map_err(|e| Error::encode("png", e.to_string()))?;
    Ok(out)
}

fn build_path(data: &PathData) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for op in &data.ops {
        match op {
            PathOp::MoveTo(x, y) => builder.move_to(*x, *y),
            PathOp::LineTo(x, y) => builder.line_to(*x, *y),
            PathOp::CurveTo(x1, y1, x2, y2, x3, y3) => {
                builder.cubic_to(*x1, *y1, *x2, *y2, *x3, *y3)
            },
            PathOp::Rectangle(x, y, w, h) => {
                builder.move_to(*x, *y);
                builder.line_to(x + w, *y);
                builder.line_to(x + w, y + h);
                builder.line_to(*x, y + h);
                builder.close();
            },
            PathOp::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn make_paint<'a>(color: Color, alpha: f32) -> Paint<'a> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(
        (color.r * 255.0).round() as u8,
        (color.g * 255.0).round() as u8,
        (color.b * 255.0).round() as u8,
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    );
    paint.anti_alias = true;
    paint
}

fn make_stroke(style: &StrokeStyle, scale: f32) -> Stroke {
    // Zero-width strokes draw as a one-device-pixel hairline.
    let width = if style.width > 0.0 { style.width } else { 1.0 / scale };
    let dash = if style.dash.is_empty() {
        None
    } else {
        StrokeDash::new(style.dash.clone(), style.dash_phase)
    };
    Stroke {
        width,
        miter_limit: style.miter_limit,
        line_cap: match style.cap {
            LineCap::Butt => SkLineCap::Butt,
            LineCap::Round => SkLineCap::Round,
            LineCap::Square => SkLineCap::Square,
        },
        line_join: match style.join {
            LineJoin::Miter => SkLineJoin::Miter,
            LineJoin::Round => SkLineJoin::Round,
            LineJoin::Bevel => SkLineJoin::Bevel,
        },
        dash,
    }
}

fn fill_rule(rule: FillRule) -> SkFillRule {
    match rule {
        FillRule::NonZero => SkFillRule::Winding,
        FillRule::EvenOdd => SkFillRule::EvenOdd,
    }
}

fn draw_image(
    pixmap: &mut Pixmap,
    image: &crate::device::ImageData,
    rect: &crate::geometry::Rect,
    alpha: f32,
    to_pixels: Transform,
    clip: Option<&Mask>,
) -> Result<()> {
    let decoded = image::load_from_memory(image.bytes())
        .map_err(|e| Error::encode("raster", format!("cannot decode embedded image: {}", e)))?
        .to_rgba8();
    let (img_w, img_h) = decoded.dimensions();
    if img_w == 0 || img_h == 0 {
        return Ok(());
    }

    let mut source = Pixmap::new(img_w, img_h)
        .ok_or_else(|| Error::encode("raster", "embedded image too large".to_string()))?;
    for (src, dst) in decoded.pixels().zip(source.pixels_mut()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }

    // Image pixel (0, 0) is the top-left corner; it lands on the
    // rect's top-left page point (x0, y1).
    let place = Transform::from_row(
        rect.width() / img_w as f32,
        0.0,
        0.0,
        -rect.height() / img_h as f32,
        rect.x0,
        rect.y1,
    );
    let mut paint = PixmapPaint::default();
    paint.opacity = alpha.clamp(0.0, 1.0);
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, to_pixels.pre_concat(place), clip);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::page::Page;

    fn empty_page(w: f32, h: f32) -> Page {
        Page::new(Rect::new(0.0, 0.0, w, h), Vec::new())
    }

    fn channel(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue())
    }

    #[test]
    fn test_pixel_size_scales_with_resolution() {
        let page = empty_page(100.0, 50.0);
        assert_eq!(pixel_size(&page, 72.0), (100, 50));
        assert_eq!(pixel_size(&page, 144.0), (200, 100));
        // Fractional sizes round up, and tiny pages stay at least 1px.
        let small = empty_page(0.5, 0.5);
        assert_eq!(pixel_size(&small, 72.0), (1, 1));
    }

    #[test]
    fn test_empty_page_is_white() {
        let pixmap = rasterize(&empty_page(10.0, 10.0), 72.0).unwrap();
        assert_eq!(channel(&pixmap, 0, 0), (255, 255, 255));
        assert_eq!(channel(&pixmap, 9, 9), (255, 255, 255));
    }

    #[test]
    fn test_filled_rect_lands_where_expected() {
        let page = Page::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![PageCommand::FillPath {
                path: PathData::rect(2.0, 2.0, 6.0, 6.0),
                rule: FillRule::NonZero,
                color: Color::rgb(1.0, 0.0, 0.0),
                alpha: 1.0,
            }],
        );
        let pixmap = rasterize(&page, 72.0).unwrap();
        assert_eq!(channel(&pixmap, 5, 5), (255, 0, 0));
        assert_eq!(channel(&pixmap, 0, 0), (255, 255, 255));
    }

    #[test]
    fn test_y_axis_is_flipped() {
        // A bar along the bottom of the page must appear in the last
        // pixel rows, not the first.
        let page = Page::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![PageCommand::FillPath {
                path: PathData::rect(0.0, 0.0, 10.0, 2.0),
                rule: FillRule::NonZero,
                color: Color::black(),
                alpha: 1.0,
            }],
        );
        let pixmap = rasterize(&page, 72.0).unwrap();
        assert_eq!(channel(&pixmap, 5, 9), (0, 0, 0));
        assert_eq!(channel(&pixmap, 5, 0), (255, 255, 255));
    }

    #[test]
    fn test_nonzero_mediabox_origin() {
        let page = Page::new(
            Rect::new(100.0, 100.0, 110.0, 110.0),
            vec![PageCommand::FillPath {
                path: PathData::rect(100.0, 108.0, 2.0, 2.0),
                rule: FillRule::NonZero,
                color: Color::black(),
                alpha: 1.0,
            }],
        );
        let pixmap = rasterize(&page, 72.0).unwrap();
        assert_eq!(pixmap.width(), 10);
        // Top-left corner of the page in pixel space.
        assert_eq!(channel(&pixmap, 1, 1), (0, 0, 0));
        assert_eq!(channel(&pixmap, 8, 8), (255, 255, 255));
    }

    #[test]
    fn test_clip_restricts_fill() {
        let page = Page::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![
                PageCommand::ClipPath {
                    path: PathData::rect(0.0, 0.0, 5.0, 10.0),
                    rule: FillRule::NonZero,
                },
                PageCommand::FillPath {
                    path: PathData::rect(0.0, 0.0, 10.0, 10.0),
                    rule: FillRule::NonZero,
                    color: Color::black(),
                    alpha: 1.0,
                },
                PageCommand::PopClip,
            ],
        );
        let pixmap = rasterize(&page, 72.0).unwrap();
        assert_eq!(channel(&pixmap, 2, 5), (0, 0, 0));
        assert_eq!(channel(&pixmap, 8, 5), (255, 255, 255));
    }

    #[test]
    fn test_group_alpha_multiplies() {
        let page = Page::new(
            Rect::new(0.0, 0.0, 4.0, 4.0),
            vec![
                PageCommand::PushGroup { alpha: 0.5, isolated: false, knockout: false },
                PageCommand::FillPath {
                    path: PathData::rect(0.0, 0.0, 4.0, 4.0),
                    rule: FillRule::NonZero,
                    color: Color::black(),
                    alpha: 1.0,
                },
                PageCommand::PopGroup,
            ],
        );
        let pixmap = rasterize(&page, 72.0).unwrap();
        let (r, _, _) = channel(&pixmap, 2, 2);
        // 50% black over white sits near mid-gray.
        assert!((120..=135).contains(&r), "r = {}", r);
    }

    #[test]
    fn test_text_runs_are_skipped() {
        let page = Page::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            vec![PageCommand::FillText {
                run: crate::device::TextRun::new(
                    "hi",
                    crate::device::FontRef::helvetica(12.0),
                    crate::geometry::Point { x: 2.0, y: 2.0 },
                ),
                color: Color::black(),
                alpha: 1.0,
            }],
        );
        let pixmap = rasterize(&page, 72.0).unwrap();
        assert_eq!(channel(&pixmap, 5, 5), (255, 255, 255));
    }

    #[test]
    fn test_rgb_and_gray_byte_lengths() {
        let pixmap = rasterize(&empty_page(8.0, 4.0), 72.0).unwrap();
        assert_eq!(rgb_bytes(&pixmap).len(), 8 * 4 * 3);
        assert_eq!(gray_bytes(&pixmap).len(), 8 * 4);
        assert!(gray_bytes(&pixmap).iter().all(|&v| v == 255));
    }

    #[test]
    fn test_encode_png_roundtrip() {
        use image::GenericImageView;

        let pixmap = rasterize(&empty_page(6.0, 3.0), 72.0).unwrap();
        let png = encode_png(&pixmap, false).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (6, 3));

        let gray_png = encode_png(&pixmap, true).unwrap();
        let decoded = image::load_from_memory(&gray_png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn test_raster_options_from_options() {
        let opts = OptionsMap::parse("resolution=150,colorspace=gray").unwrap();
        let settings = RasterOptions::from_options(&opts).unwrap();
        assert_eq!(settings.resolution, 150.0);
        assert!(settings.gray);

        let defaults = RasterOptions::from_options(&OptionsMap::parse("").unwrap()).unwrap();
        assert_eq!(defaults.resolution, DEFAULT_RESOLUTION);
        assert!(!defaults.gray);

        let bad = OptionsMap::parse("resolution=5000").unwrap();
        assert!(RasterOptions::from_options(&bad).is_err());
        let bad = OptionsMap::parse("colorspace=cmyk").unwrap();
        assert!(RasterOptions::from_options(&bad).is_err());
    }
}
