//! PNM backend.
//!
//! Emits binary NetPBM frames back to back, one per page: P6 for RGB
//! or P5 for grayscale, both with a maxval of 255. Concatenated frames
//! are the NetPBM convention for multi-image files and are what `pamsplit`
//! and friends expect.

use std::io::{Seek, Write};

use crate::error::Result;
use crate::page::Page;
use crate::raster::{gray_bytes, rasterize, rgb_bytes, RasterOptions};

/// Streams raw raster frames into the sink.
pub(crate) struct PnmBackend<W: Write + Seek> {
    sink: W,
    options: RasterOptions,
}

impl<W: Write + Seek> PnmBackend<W> {
    pub(crate) fn new(sink: W, options: RasterOptions) -> Self {
        Self { sink, options }
    }
}

impl<W: Write + Seek> super::FormatBackend<W> for PnmBackend<W> {
    fn append_page(&mut self, page: &Page) -> Result<()> {
        let pixmap = rasterize(page, self.options.resolution)?;
        if self.options.gray {
            write!(self.sink, "P5\n{} {}\n255\n", pixmap.width(), pixmap.height())?;
            self.sink.write_all(&gray_bytes(&pixmap))?;
        } else {
            write!(self.sink, "P6\n{} {}\n255\n", pixmap.width(), pixmap.height())?;
            self.sink.write_all(&rgb_bytes(&pixmap))?;
        }
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<W> {
        let mut this = *self;
        this.sink.flush()?;
        Ok(this.sink)
    }
}
