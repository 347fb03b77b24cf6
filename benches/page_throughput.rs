//! Criterion benchmarks for the page writing pipeline.
//!
//! Measures full begin/draw/end/close cycles per backend: vector
//! serialization for PDF and text, rasterization plus encoding for the
//! pixel formats.

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pagepress::{Color, DocumentWriter, Format, PageRecorder, PathData, Rect, StrokeStyle};

/// Record a busy A4 page: a color grid, a zig-zag stroke, some text.
fn draw_busy_page(page: &mut PageRecorder) {
    for row in 0..8 {
        for col in 0..6 {
            let x = 40.0 + col as f32 * 85.0;
            let y = 60.0 + row as f32 * 90.0;
            page.fill_rect(
                Rect::new(x, y, x + 70.0, y + 75.0),
                Color::rgb(row as f32 / 8.0, col as f32 / 6.0, 0.5),
            );
        }
    }

    let mut zigzag = PathData::new().move_to(40.0, 30.0);
    for i in 1..=20 {
        let y = if i % 2 == 0 { 30.0 } else { 45.0 };
        zigzag = zigzag.line_to(40.0 + i as f32 * 25.0, y);
    }
    page.stroke_path(zigzag, StrokeStyle::default(), Color::black(), 1.0);

    for line in 0..10 {
        page.add_text(
            &format!("measured line {}", line),
            40.0,
            800.0 - line as f32 * 14.0,
            "Helvetica",
            9.0,
        );
    }
}

/// Write a whole document to memory and return its size.
fn write_doc(format: Format, options: &str, pages: usize) -> usize {
    let mut writer = DocumentWriter::from_sink(Cursor::new(Vec::new()), format, options).unwrap();
    for _ in 0..pages {
        let page = writer.begin_page(Rect::new(0.0, 0.0, 595.0, 842.0)).unwrap();
        draw_busy_page(page);
        writer.end_page().unwrap();
    }
    writer.finish().unwrap().into_inner().len()
}

fn bench_pdf_writing(c: &mut Criterion) {
    c.bench_function("pdf 10 pages uncompressed", |b| {
        b.iter(|| black_box(write_doc(Format::Pdf, "", 10)));
    });

    c.bench_function("pdf 10 pages compressed", |b| {
        b.iter(|| black_box(write_doc(Format::Pdf, "compress", 10)));
    });
}

fn bench_raster_writing(c: &mut Criterion) {
    c.bench_function("cbz 1 page at 96 dpi", |b| {
        b.iter(|| black_box(write_doc(Format::Cbz, "", 1)));
    });

    c.bench_function("pnm 1 page at 96 dpi gray", |b| {
        b.iter(|| black_box(write_doc(Format::Pnm, "colorspace=gray", 1)));
    });
}

fn bench_text_writing(c: &mut Criterion) {
    c.bench_function("text 10 pages", |b| {
        b.iter(|| black_box(write_doc(Format::Text, "", 10)));
    });
}

criterion_group!(
    benches,
    bench_pdf_writing,
    bench_raster_writing,
    bench_text_writing,
);
criterion_main!(benches);
