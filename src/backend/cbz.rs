//! CBZ backend.
//!
//! A CBZ file is a ZIP archive of page images, read in entry-name
//! order by comic readers. Pages are rasterized to PNG and stored
//! without further deflate, since PNG data does not compress again.
//! Entries are named `p0001.png`, `p0002.png`, ... with the starting
//! number adjustable through the `start` option for multi-volume
//! output.

use std::io::{Seek, Write};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::options::{parse_u32, unknown_key, OptionsMap};
use crate::page::Page;
use crate::raster::{encode_png, rasterize, RasterOptions};

/// Validated options for CBZ output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CbzOptions {
    /// Resolution and colorspace for the page images
    pub raster: RasterOptions,
    /// Page number of the first archive entry
    pub start: u32,
}

impl Default for CbzOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::default(),
            start: 1,
        }
    }
}

impl CbzOptions {
    pub(crate) fn from_options(opts: &OptionsMap) -> Result<Self> {
        for key in opts.keys() {
            match key {
                "resolution" | "colorspace" | "start" => {},
                other => return Err(unknown_key("cbz", other)),
            }
        }
        let mut options = Self {
            raster: RasterOptions::from_options(opts)?,
            ..Self::default()
        };
        if let Some(value) = opts.get("start") {
            options.start = parse_u32("start", value)?;
            if options.start == 0 {
                return Err(Error::InvalidOption {
                    key: "start".to_string(),
                    reason: "page numbering starts at 1".to_string(),
                });
            }
        }
        Ok(options)
    }
}

/// Streams rasterized pages into a ZIP archive.
pub(crate) struct CbzBackend<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: CbzOptions,
    page_index: u32,
}

impl<W: Write + Seek> CbzBackend<W> {
    pub(crate) fn new(sink: W, options: CbzOptions) -> Self {
        Self {
            zip: ZipWriter::new(sink),
            options,
            page_index: 0,
        }
    }
}

impl<W: Write + Seek> super::FormatBackend<W> for CbzBackend<W> {
    fn append_page(&mut self, page: &Page) -> Result<()> {
        let pixmap = rasterize(page, self.options.raster.resolution)?;
        let png = encode_png(&pixmap, self.options.raster.gray)?;
        let name = format!("p{:04}.png", self.options.start + self.page_index);
        let entry = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.zip.start_file(name, entry).map_err(zip_err)?;
        self.zip.write_all(&png)?;
        self.page_index += 1;
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<W> {
        let this = *self;
        let mut sink = this.zip.finish().map_err(zip_err)?;
        sink.flush()?;
        Ok(sink)
    }
}

fn zip_err(e: ZipError) -> Error {
    match e {
        ZipError::Io(io) => Error::Io(io),
        other => Error::encode("cbz", other.to_string()),
    }
}
