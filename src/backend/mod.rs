//! Format backends.
//!
//! A backend owns the output sink and turns finished pages into bytes
//! of its format, one page at a time. Options are validated up front by
//! [`BackendConfig::resolve`], before the writer touches the sink at
//! all, so a typo in an option string can never leave a half-created
//! output file behind.

use std::io::{Seek, Write};

use crate::error::Result;
use crate::format::Format;
use crate::options::OptionsMap;
use crate::page::Page;
use crate::raster::RasterOptions;

pub(crate) mod cbz;
pub(crate) mod pdf;
pub(crate) mod pnm;
pub(crate) mod text;

use cbz::{CbzBackend, CbzOptions};
use pdf::{PdfBackend, PdfOptions};
use pnm::PnmBackend;
use text::TextBackend;

/// One output format's encoder.
///
/// Backends receive pages strictly in document order and exactly one
/// `finalize` call. The sink travels with the backend and is handed
/// back by `finalize` after trailing structures are flushed.
pub(crate) trait FormatBackend<W: Write + Seek> {
    /// Encode one page and write it to the sink.
    fn append_page(&mut self, page: &Page) -> Result<()>;

    /// Write trailing structures and return the sink.
    fn finalize(self: Box<Self>) -> Result<W>;
}

/// Validated, typed options for one backend.
///
/// Splitting validation from construction keeps all fallible string
/// handling ahead of sink creation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendConfig {
    Pdf(PdfOptions),
    Cbz(CbzOptions),
    Pnm(RasterOptions),
    Text,
}

impl BackendConfig {
    /// Parse and validate an option string for the given format.
    pub(crate) fn resolve(format: Format, options: &str) -> Result<Self> {
        let opts = OptionsMap::parse(options)?;
        match format {
            Format::Pdf => Ok(BackendConfig::Pdf(PdfOptions::from_options(&opts)?)),
            Format::Cbz => Ok(BackendConfig::Cbz(CbzOptions::from_options(&opts)?)),
            Format::Pnm => {
                for key in opts.keys() {
                    match key {
                        "resolution" | "colorspace" => {},
                        other => return Err(crate::options::unknown_key("pnm", other)),
                    }
                }
                Ok(BackendConfig::Pnm(RasterOptions::from_options(&opts)?))
            },
            Format::Text => {
                if let Some(key) = opts.keys().next() {
                    return Err(crate::options::unknown_key("text", key));
                }
                Ok(BackendConfig::Text)
            },
        }
    }

    /// The format this configuration belongs to.
    pub(crate) fn format(&self) -> Format {
        match self {
            BackendConfig::Pdf(_) => Format::Pdf,
            BackendConfig::Cbz(_) => Format::Cbz,
            BackendConfig::Pnm(_) => Format::Pnm,
            BackendConfig::Text => Format::Text,
        }
    }

    /// Attach a sink and build the backend. PDF writes its header here;
    /// the other formats stay silent until the first page.
    pub(crate) fn into_backend<W: Write + Seek + 'static>(
        self,
        sink: W,
    ) -> Result<Box<dyn FormatBackend<W>>> {
        Ok(match self {
            BackendConfig::Pdf(opts) => Box::new(PdfBackend::new(sink, opts)?),
            BackendConfig::Cbz(opts) => Box::new(CbzBackend::new(sink, opts)),
            BackendConfig::Pnm(opts) => Box::new(PnmBackend::new(sink, opts)),
            BackendConfig::Text => Box::new(TextBackend::new(sink)),
        })
    }
}
