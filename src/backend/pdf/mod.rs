//! Incremental PDF backend.
//!
//! Objects are written the moment they are complete: the header goes
//! out at construction, each page's content stream, resources, and
//! page dictionary as the page arrives, and the page tree, catalog,
//! info dictionary, cross-reference table, and trailer at finalize.
//! Finished pages are never kept in memory.
//!
//! Text arrives two ways: visible runs recorded by the device, and
//! invisible OCR regions painted with text rendering mode 3 so that
//! selection and search work over scanned content.

mod content;
mod objects;

use std::collections::HashMap;
use std::io::{Seek, Write};

use bytes::Bytes;
use chrono::Utc;

use crate::device::{
    ColorSpace, FillRule, ImageData, ImageEncoding, PageCommand, PathData, PathOp,
};
use crate::error::{Error, Result};
use crate::options::{parse_bool, unknown_key, OptionsMap};
use crate::page::{Page, TextRegion};

use content::{ContentOp, ContentStream};
use objects::{write_indirect, Dict, Object, ObjectRef};

/// Average glyph advance relative to font size, used to stretch
/// invisible OCR text across its detected bounding box.
const OCR_AVG_ADVANCE: f32 = 0.5;

/// Validated options for PDF output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PdfOptions {
    /// Flate-compress content streams
    pub compress: bool,
    /// Header version as (major, minor)
    pub version: (u8, u8),
    /// /Creator info entry
    pub creator: String,
    /// /Producer info entry
    pub producer: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            compress: false,
            version: (1, 7),
            creator: "pagepress".to_string(),
            producer: concat!("pagepress ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl PdfOptions {
    pub(crate) fn from_options(opts: &OptionsMap) -> Result<Self> {
        for key in opts.keys() {
            match key {
                "compress" | "version" | "creator" | "producer" => {},
                other => return Err(unknown_key("pdf", other)),
            }
        }
        let mut options = Self::default();
        if let Some(value) = opts.get("compress") {
            // "flate" names the only filter offered, so it means yes
            options.compress =
                value.eq_ignore_ascii_case("flate") || parse_bool("compress", value)?;
        }
        if let Some(value) = opts.get("version") {
            options.version = parse_version(value)?;
        }
        if let Some(value) = opts.get("creator") {
            options.creator = value.to_string();
        }
        if let Some(value) = opts.get("producer") {
            options.producer = value.to_string();
        }
        Ok(options)
    }
}

fn parse_version(value: &str) -> Result<(u8, u8)> {
    let invalid = || Error::InvalidOption {
        key: "version".to_string(),
        reason: format!("'{}' is not a supported PDF version", value),
    };
    let (major, minor) = value.split_once('.').ok_or_else(invalid)?;
    let major: u8 = major.parse().map_err(|_| invalid())?;
    let minor: u8 = minor.parse().map_err(|_| invalid())?;
    match (major, minor) {
        (1, 2..=7) | (2, 0) => Ok((major, minor)),
        _ => Err(invalid()),
    }
}

/// A base font registered with the document.
#[derive(Debug, Clone)]
struct FontEntry {
    res_name: String,
    obj: ObjectRef,
}

/// Resources referenced by one page's content stream.
#[derive(Default)]
struct PageResources {
    fonts: Dict,
    xobjects: Dict,
    ext_gstates: Dict,
}

/// The streaming PDF writer.
pub(crate) struct PdfBackend<W: Write + Seek> {
    sink: W,
    options: PdfOptions,
    /// Byte offset of every written object, for the xref table
    offsets: Vec<(u32, u64)>,
    next_id: u32,
    /// Reserved object number for the page tree, written at finalize
    pages_id: u32,
    page_refs: Vec<ObjectRef>,
    /// Base font name to font object, shared across pages
    fonts: HashMap<String, FontEntry>,
}

impl<W: Write + Seek> PdfBackend<W> {
    pub(crate) fn new(mut sink: W, options: PdfOptions) -> Result<Self> {
        writeln!(sink, "%PDF-{}.{}", options.version.0, options.version.1)?;
        // Binary marker so transfer tools treat the file as binary
        sink.write_all(b"%\xE2\xE3\xCF\xD3\n")?;
        Ok(Self {
            sink,
            options,
            offsets: Vec::new(),
            next_id: 2,
            pages_id: 1,
            page_refs: Vec::new(),
            fonts: HashMap::new(),
        })
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn write_object(&mut self, id: u32, obj: &Object) -> Result<()> {
        let offset = self.sink.stream_position()?;
        self.offsets.push((id, offset));
        write_indirect(&mut self.sink, id, obj)?;
        Ok(())
    }

    /// Get or create the font object for a base-14 font name.
    fn font_for(&mut self, base: &str) -> Result<FontEntry> {
        if let Some(entry) = self.fonts.get(base) {
            return Ok(entry.clone());
        }
        let id = self.alloc();
        let entry = FontEntry {
            res_name: format!("F{}", self.fonts.len() + 1),
            obj: ObjectRef::new(id),
        };
        let obj = Object::dict([
            ("Type", Object::name("Font")),
            ("Subtype", Object::name("Type1")),
            ("BaseFont", Object::name(base)),
            ("Encoding", Object::name("WinAnsiEncoding")),
        ]);
        self.write_object(id, &obj)?;
        self.fonts.insert(base.to_string(), entry.clone());
        Ok(entry)
    }

    /// Write an image XObject and return its reference.
    ///
    /// JPEG data passes through untouched under DCTDecode; PNG is
    /// decoded to raw samples and re-compressed with Flate.
    fn image_xobject(&mut self, image: &ImageData) -> Result<ObjectRef> {
        let (dict, data) = match image.encoding() {
            ImageEncoding::Jpeg => {
                let dict = Dict::from([
                    ("Type".to_string(), Object::name("XObject")),
                    ("Subtype".to_string(), Object::name("Image")),
                    ("Width".to_string(), Object::Integer(i64::from(image.width()))),
                    ("Height".to_string(), Object::Integer(i64::from(image.height()))),
                    ("ColorSpace".to_string(), Object::name(image.color_space().pdf_name())),
                    ("BitsPerComponent".to_string(), Object::Integer(8)),
                    ("Filter".to_string(), Object::name("DCTDecode")),
                ]);
                (dict, image.bytes().clone())
            },
            ImageEncoding::Png => {
                let decoded = image::load_from_memory(image.bytes())
                    .map_err(|e| Error::encode("pdf", format!("cannot decode image: {}", e)))?;
                let (samples, colorspace) = match image.color_space() {
                    ColorSpace::DeviceGray => (decoded.to_luma8().into_raw(), "DeviceGray"),
                    _ => (decoded.to_rgb8().into_raw(), "DeviceRGB"),
                };
                let dict = Dict::from([
                    ("Type".to_string(), Object::name("XObject")),
                    ("Subtype".to_string(), Object::name("Image")),
                    ("Width".to_string(), Object::Integer(i64::from(image.width()))),
                    ("Height".to_string(), Object::Integer(i64::from(image.height()))),
                    ("ColorSpace".to_string(), Object::name(colorspace)),
                    ("BitsPerComponent".to_string(), Object::Integer(8)),
                    ("Filter".to_string(), Object::name("FlateDecode")),
                ]);
                (dict, Bytes::from(compress_data(&samples)?))
            },
        };
        let id = self.alloc();
        self.write_object(id, &Object::Stream { dict, data })?;
        Ok(ObjectRef::new(id))
    }

    /// Get or create the /GS entry for a constant alpha on this page.
    fn gstate_for(
        &mut self,
        alpha: f32,
        names: &mut HashMap<u32, String>,
        res: &mut PageResources,
    ) -> Result<String> {
        if let Some(name) = names.get(&alpha.to_bits()) {
            return Ok(name.clone());
        }
        let id = self.alloc();
        let name = format!("GS{}", names.len() + 1);
        self.write_object(
            id,
            &Object::dict([
                ("Type", Object::name("ExtGState")),
                ("ca", Object::Real(alpha)),
                ("CA", Object::Real(alpha)),
            ]),
        )?;
        res.ext_gstates
            .insert(name.clone(), Object::Reference(ObjectRef::new(id)));
        names.insert(alpha.to_bits(), name.clone());
        Ok(name)
    }

    /// Translate one page's commands and OCR overlay into content
    /// stream operations, registering resources as they appear.
    fn build_content(&mut self, page: &Page, res: &mut PageResources) -> Result<ContentStream> {
        let mut ops = ContentStream::new();
        let mut alpha_names: HashMap<u32, String> = HashMap::new();
        // Alpha currently installed via gs, and its value at each
        // outstanding q, since Q restores it.
        let mut current_alpha = 1.0f32;
        let mut saved_alphas: Vec<f32> = Vec::new();
        // Transparency groups become q..Q spans whose alpha multiplies
        // into everything painted inside.
        let mut group_alphas: Vec<f32> = Vec::new();

        for command in &page.commands {
            let group_product: f32 = group_alphas.iter().product();
            match command {
                PageCommand::FillPath { path, rule, color, alpha } => {
                    self.set_alpha(
                        alpha * group_product,
                        &mut current_alpha,
                        &mut alpha_names,
                        res,
                        &mut ops,
                    )?;
                    ops.push(ContentOp::SetFillRgb(color.r, color.g, color.b));
                    push_path(&mut ops, path);
                    ops.push(match rule {
                        FillRule::NonZero => ContentOp::Fill,
                        FillRule::EvenOdd => ContentOp::FillEvenOdd,
                    });
                },
                PageCommand::StrokePath { path, style, color, alpha } => {
                    self.set_alpha(
                        alpha * group_product,
                        &mut current_alpha,
                        &mut alpha_names,
                        res,
                        &mut ops,
                    )?;
                    ops.push(ContentOp::SetStrokeRgb(color.r, color.g, color.b));
                    ops.push(ContentOp::SetLineWidth(style.width));
                    ops.push(ContentOp::SetLineCap(style.cap as u8));
                    ops.push(ContentOp::SetLineJoin(style.join as u8));
                    ops.push(ContentOp::SetMiterLimit(style.miter_limit));
                    ops.push(ContentOp::SetDash(style.dash.clone(), style.dash_phase));
                    push_path(&mut ops, path);
                    ops.push(ContentOp::Stroke);
                },
                PageCommand::ClipPath { path, rule } => {
                    ops.push(ContentOp::SaveState);
                    saved_alphas.push(current_alpha);
                    push_path(&mut ops, path);
                    ops.push(match rule {
                        FillRule::NonZero => ContentOp::Clip,
                        FillRule::EvenOdd => ContentOp::ClipEvenOdd,
                    });
                    ops.push(ContentOp::EndPath);
                },
                PageCommand::PopClip | PageCommand::PopGroup => {
                    ops.push(ContentOp::RestoreState);
                    if let Some(alpha) = saved_alphas.pop() {
                        current_alpha = alpha;
                    }
                    if matches!(command, PageCommand::PopGroup) {
                        group_alphas.pop();
                    }
                },
                PageCommand::FillText { run, color, alpha } => {
                    self.set_alpha(
                        alpha * group_product,
                        &mut current_alpha,
                        &mut alpha_names,
                        res,
                        &mut ops,
                    )?;
                    let font = self.font_for(&run.font.name)?;
                    res.fonts
                        .insert(font.res_name.clone(), Object::Reference(font.obj));
                    ops.extend([
                        ContentOp::BeginText,
                        ContentOp::SetFillRgb(color.r, color.g, color.b),
                        ContentOp::SetFont(font.res_name, run.font.size),
                        ContentOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, run.origin.x, run.origin.y),
                        ContentOp::ShowText(run.text.clone()),
                        ContentOp::EndText,
                    ]);
                },
                PageCommand::DrawImage { image, rect, alpha } => {
                    self.set_alpha(
                        alpha * group_product,
                        &mut current_alpha,
                        &mut alpha_names,
                        res,
                        &mut ops,
                    )?;
                    let xref = self.image_xobject(image)?;
                    let name = format!("Im{}", res.xobjects.len() + 1);
                    res.xobjects
                        .insert(name.clone(), Object::Reference(xref));
                    ops.extend([
                        ContentOp::SaveState,
                        ContentOp::Transform(
                            rect.width(),
                            0.0,
                            0.0,
                            rect.height(),
                            rect.x0,
                            rect.y0,
                        ),
                        ContentOp::PaintXObject(name),
                        ContentOp::RestoreState,
                    ]);
                },
                PageCommand::PushGroup { alpha, .. } => {
                    ops.push(ContentOp::SaveState);
                    saved_alphas.push(current_alpha);
                    group_alphas.push(*alpha);
                },
            }
        }

        for region in &page.ocr_text {
            let helvetica = self.font_for("Helvetica")?;
            res.fonts
                .insert(helvetica.res_name.clone(), Object::Reference(helvetica.obj));
            push_hidden_text(&mut ops, region, &helvetica.res_name);
        }

        Ok(ops)
    }

    fn set_alpha(
        &mut self,
        alpha: f32,
        current: &mut f32,
        names: &mut HashMap<u32, String>,
        res: &mut PageResources,
        ops: &mut ContentStream,
    ) -> Result<()> {
        let alpha = alpha.clamp(0.0, 1.0);
        if (alpha - *current).abs() < 1e-4 {
            return Ok(());
        }
        let name = self.gstate_for(alpha, names, res)?;
        ops.push(ContentOp::SetExtGState(name));
        *current = alpha;
        Ok(())
    }
}

impl<W: Write + Seek> super::FormatBackend<W> for PdfBackend<W> {
    fn append_page(&mut self, page: &Page) -> Result<()> {
        let mut res = PageResources::default();
        let ops = self.build_content(page, &mut res)?;

        let raw = ops.to_bytes();
        let mut stream_dict = Dict::new();
        let data = if self.options.compress {
            stream_dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            Bytes::from(compress_data(&raw)?)
        } else {
            Bytes::from(raw)
        };
        let content_id = self.alloc();
        self.write_object(content_id, &Object::Stream { dict: stream_dict, data })?;

        let mut resources = Dict::new();
        if !res.fonts.is_empty() {
            resources.insert("Font".to_string(), Object::Dictionary(res.fonts));
        }
        if !res.xobjects.is_empty() {
            resources.insert("XObject".to_string(), Object::Dictionary(res.xobjects));
        }
        if !res.ext_gstates.is_empty() {
            resources.insert("ExtGState".to_string(), Object::Dictionary(res.ext_gstates));
        }

        let mediabox = page.mediabox;
        let page_obj = Object::dict([
            ("Type", Object::name("Page")),
            ("Parent", Object::Reference(ObjectRef::new(self.pages_id))),
            ("MediaBox", Object::reals([mediabox.x0, mediabox.y0, mediabox.x1, mediabox.y1])),
            ("Contents", Object::Reference(ObjectRef::new(content_id))),
            ("Resources", Object::Dictionary(resources)),
        ]);
        let page_id = self.alloc();
        self.write_object(page_id, &page_obj)?;
        self.page_refs.push(ObjectRef::new(page_id));
        log::debug!("pdf: wrote page {} as object {}", self.page_refs.len(), page_id);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<W> {
        let mut this = *self;

        let kids = Object::Array(
            this.page_refs.iter().map(|r| Object::Reference(*r)).collect(),
        );
        let count = this.page_refs.len() as i64;
        let pages_id = this.pages_id;
        this.write_object(
            pages_id,
            &Object::dict([
                ("Type", Object::name("Pages")),
                ("Kids", kids),
                ("Count", Object::Integer(count)),
            ]),
        )?;

        let catalog_id = this.alloc();
        this.write_object(
            catalog_id,
            &Object::dict([
                ("Type", Object::name("Catalog")),
                ("Pages", Object::Reference(ObjectRef::new(pages_id))),
            ]),
        )?;

        let info_id = this.alloc();
        let date = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
        this.write_object(
            info_id,
            &Object::dict([
                ("Creator", Object::text(&this.options.creator)),
                ("Producer", Object::text(&this.options.producer)),
                ("CreationDate", Object::text(&date)),
            ]),
        )?;

        let xref_start = this.sink.stream_position()?;
        writeln!(this.sink, "xref")?;
        writeln!(this.sink, "0 {}", this.next_id)?;
        // Object 0 is always free
        writeln!(this.sink, "0000000000 65535 f ")?;
        this.offsets.sort_by_key(|(id, _)| *id);
        for (_, offset) in &this.offsets {
            writeln!(this.sink, "{:010} 00000 n ", offset)?;
        }

        let trailer = Object::dict([
            ("Size", Object::Integer(this.next_id as i64)),
            ("Root", Object::Reference(ObjectRef::new(catalog_id))),
            ("Info", Object::Reference(ObjectRef::new(info_id))),
        ]);
        writeln!(this.sink, "trailer")?;
        trailer.write_to(&mut this.sink)?;
        writeln!(this.sink)?;
        writeln!(this.sink, "startxref")?;
        writeln!(this.sink, "{}", xref_start)?;
        write!(this.sink, "%%EOF")?;
        this.sink.flush()?;
        Ok(this.sink)
    }
}

fn push_path(ops: &mut ContentStream, path: &PathData) {
    for op in &path.ops {
        ops.push(match op {
            PathOp::MoveTo(x, y) => ContentOp::MoveTo(*x, *y),
            PathOp::LineTo(x, y) => ContentOp::LineTo(*x, *y),
            PathOp::CurveTo(x1, y1, x2, y2, x3, y3) => {
                ContentOp::CurveTo(*x1, *y1, *x2, *y2, *x3, *y3)
            },
            PathOp::Rectangle(x, y, w, h) => ContentOp::Rectangle(*x, *y, *w, *h),
            PathOp::ClosePath => ContentOp::ClosePath,
        });
    }
}

/// Emit one OCR region as invisible text stretched over its box.
fn push_hidden_text(ops: &mut ContentStream, region: &TextRegion, font_res: &str) {
    let size = region.bbox.height();
    if size <= 0.0 || region.text.is_empty() {
        return;
    }
    let glyph_count = region.text.chars().count() as f32;
    let natural_width = OCR_AVG_ADVANCE * size * glyph_count;
    let x_scale = if natural_width > 0.0 {
        region.bbox.width() / natural_width
    } else {
        1.0
    };
    ops.extend([
        ContentOp::BeginText,
        ContentOp::SetFont(font_res.to_string(), size),
        ContentOp::SetTextRenderMode(3),
        ContentOp::SetTextMatrix(x_scale, 0.0, 0.0, 1.0, region.bbox.x0, region.bbox.y0),
        ContentOp::ShowText(region.text.clone()),
        ContentOp::EndText,
    ]);
}

/// Compress data for a FlateDecode filter.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
