//! # Pagepress
//!
//! Multi-format, page-at-a-time document writer.
//!
//! A [`DocumentWriter`] is bound at creation to an output sink, a
//! [`Format`], and an option string. Documents are produced
//! incrementally: each page is opened against a media box, drawn
//! through a recording device, and streamed to the sink as soon as it
//! is ended. No page accumulates in memory past its own end-of-page,
//! so output size is unbounded while memory stays flat.
//!
//! ## Formats
//!
//! - **pdf** - vector PDF, one content stream per page, optional Flate
//!   compression and an invisible text layer for OCR results
//! - **cbz** - comic book archive, one PNG per page in a ZIP container
//! - **pnm** - concatenated binary NetPBM frames (P6 color, P5 gray)
//! - **text** - recorded and recognized text, form feed between pages
//!
//! ## Quick start
//!
//! ```
//! use std::io::Cursor;
//! use pagepress::{Color, DocumentWriter, Format, Rect};
//!
//! let sink = Cursor::new(Vec::new());
//! let mut writer = DocumentWriter::from_sink(sink, Format::Pdf, "compress")?;
//!
//! let page = writer.begin_page(Rect::new(0.0, 0.0, 595.0, 842.0))?;
//! page.fill_rect(Rect::new(72.0, 720.0, 300.0, 770.0), Color::rgb(0.2, 0.4, 0.8));
//! page.add_text("Hello from pagepress", 72.0, 680.0, "Helvetica", 14.0);
//! writer.end_page()?;
//!
//! let pdf = writer.finish()?.into_inner();
//! assert!(pdf.starts_with(b"%PDF-1.7"));
//! # Ok::<(), pagepress::Error>(())
//! ```
//!
//! ## OCR
//!
//! With an engine attached via [`DocumentWriter::set_ocr_engine`],
//! every finished page is rasterized and recognized before encoding;
//! the PDF backend renders the results as an invisible text layer over
//! the page, the text backend emits them as plain lines. Recognition
//! failures never lose a page - they are downgraded to [`Warning`]s
//! and the page is written without a text layer.
//!
//! The `ocr` cargo feature provides [`ocr::ocrs_engine::OcrsRecognizer`],
//! an engine backed by the pure-Rust `ocrs` models. Any other engine
//! can be plugged in through the [`TextRecognizer`] trait.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Page-space geometry
pub mod geometry;

// Output format registry
pub mod format;

// The per-page recording device
pub mod device;

// Finished pages, handed from the device to a backend
mod page;

// Option string parsing and per-format validation helpers
pub mod options;

// Shared rasterizer behind the pixel formats and the OCR stage
mod raster;

// Format backends: pdf, cbz, pnm, text
mod backend;

// The OCR stage and the recognizer abstraction
pub mod ocr;

// The writer state machine
pub mod writer;

// Re-exports
pub use device::{
    Color, ColorSpace, FillRule, FontRef, ImageData, ImageEncoding, ImageError, LineCap, LineJoin,
    PageCommand, PageRecorder, PathData, PathOp, StrokeStyle, TextRun,
};
pub use error::{Error, Result};
pub use format::Format;
pub use geometry::{Point, Rect};
pub use ocr::{OcrError, ProgressListener, RecognizedLine, TextRecognizer};
pub use writer::{DocumentWriter, Warning};

#[cfg(feature = "ocr")]
#[cfg_attr(docsrs, doc(cfg(feature = "ocr")))]
pub use ocr::ocrs_engine::{ModelPaths, OcrsRecognizer};
