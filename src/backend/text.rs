//! Plain text backend.
//!
//! Collects the page's text runs (and any OCR regions) and lays them
//! out as reading-order lines: fragments whose baselines sit within a
//! small vertical tolerance form one line, lines run top to bottom,
//! fragments within a line left to right. Each page ends with a form
//! feed, the page separator convention of text converters.

use std::cmp::Ordering;
use std::io::{Seek, Write};

use crate::error::Result;
use crate::page::Page;

/// Baseline distance within which fragments share a line, in points.
const LINE_TOLERANCE: f32 = 2.0;

/// Streams page text to the sink.
pub(crate) struct TextBackend<W: Write + Seek> {
    sink: W,
}

impl<W: Write + Seek> TextBackend<W> {
    pub(crate) fn new(sink: W) -> Self {
        Self { sink }
    }
}

impl<W: Write + Seek> super::FormatBackend<W> for TextBackend<W> {
    fn append_page(&mut self, page: &Page) -> Result<()> {
        for line in assemble_lines(collect_fragments(page)) {
            writeln!(self.sink, "{}", line)?;
        }
        self.sink.write_all(b"\x0c")?;
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<W> {
        let mut this = *self;
        this.sink.flush()?;
        Ok(this.sink)
    }
}

/// One piece of positioned text, from a run or an OCR region.
struct Fragment {
    x: f32,
    y: f32,
    text: String,
}

fn collect_fragments(page: &Page) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for command in &page.commands {
        if let crate::device::PageCommand::FillText { run, .. } = command {
            fragments.push(Fragment {
                x: run.origin.x,
                y: run.origin.y,
                text: run.text.clone(),
            });
        }
    }
    for region in &page.ocr_text {
        fragments.push(Fragment {
            x: region.bbox.x0,
            y: region.bbox.y0,
            text: region.text.clone(),
        });
    }
    fragments
}

fn assemble_lines(mut fragments: Vec<Fragment>) -> Vec<String> {
    // Page space grows upward, so reading order is descending y.
    fragments.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal));

    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    for fragment in fragments {
        match lines.last_mut() {
            Some(line) if (line[0].y - fragment.y).abs() <= LINE_TOLERANCE => {
                line.push(fragment);
            },
            _ => lines.push(vec![fragment]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
            line.iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FormatBackend;
    use crate::device::{Color, FontRef, PageCommand, TextRun};
    use crate::geometry::{Point, Rect};
    use crate::page::TextRegion;
    use std::io::Cursor;

    fn run(text: &str, x: f32, y: f32) -> PageCommand {
        PageCommand::FillText {
            run: TextRun::new(text, FontRef::helvetica(12.0), Point { x, y }),
            color: Color::black(),
            alpha: 1.0,
        }
    }

    fn write_text(pages: Vec<Page>) -> String {
        let mut backend: Box<dyn FormatBackend<Cursor<Vec<u8>>>> =
            Box::new(TextBackend::new(Cursor::new(Vec::new())));
        for page in &pages {
            backend.append_page(page).unwrap();
        }
        String::from_utf8(backend.finalize().unwrap().into_inner()).unwrap()
    }

    #[test]
    fn test_fragments_merge_into_lines() {
        let page = Page::new(
            Rect::new(0.0, 0.0, 200.0, 100.0),
            vec![
                run("world", 60.0, 80.0),
                run("hello", 10.0, 80.5),
                run("below", 10.0, 40.0),
            ],
        );
        let out = write_text(vec![page]);
        assert_eq!(out, "hello world\nbelow\n\x0c");
    }

    #[test]
    fn test_ocr_regions_join_reading_order() {
        let mut page = Page::new(Rect::new(0.0, 0.0, 200.0, 100.0), vec![run("typed", 10.0, 90.0)]);
        page.ocr_text.push(TextRegion {
            text: "recognized".to_string(),
            bbox: Rect::new(10.0, 20.0, 120.0, 32.0),
        });
        let out = write_text(vec![page]);
        assert_eq!(out, "typed\nrecognized\n\x0c");
    }

    #[test]
    fn test_form_feed_per_page() {
        let first = Page::new(Rect::new(0.0, 0.0, 100.0, 100.0), vec![run("one", 5.0, 50.0)]);
        let second = Page::new(Rect::new(0.0, 0.0, 100.0, 100.0), vec![run("two", 5.0, 50.0)]);
        let out = write_text(vec![first, second]);
        assert_eq!(out, "one\n\x0ctwo\n\x0c");
    }

    #[test]
    fn test_empty_page_is_just_a_form_feed() {
        let page = Page::new(Rect::new(0.0, 0.0, 100.0, 100.0), Vec::new());
        assert_eq!(write_text(vec![page]), "\x0c");
    }
}
