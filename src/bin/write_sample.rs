//! Render a document description to any supported output format.
//!
//! Reads a JSON document description (or builds a two-page sample when
//! no input is given) and writes it out as pdf, cbz, pnm, or text. The
//! format is inferred from the output file's extension unless --format
//! is given.
//!
//! Usage:
//!   cargo run --bin write_sample -- out.pdf
//!   cargo run --bin write_sample -- --options compress,version=1.4 out.pdf
//!   cargo run --bin write_sample -- --input doc.json --format cbz pages.cbz
//!   cargo run --features ocr --bin write_sample -- --ocr scan.pdf

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Deserialize;

use pagepress::{Color, DocumentWriter, FillRule, Format, ImageData, PathData, Rect};

const USAGE: &str = "\
write_sample: render a document description to pdf, cbz, pnm, or text

Usage:
  write_sample [--format FMT] [--options KEY=VAL,...] [--input doc.json] [--ocr] OUTPUT

The format is taken from --format, or inferred from OUTPUT's extension.
Without --input, a built-in two-page sample document is rendered.

Option strings are format specific, for example:
  pdf:  compress,version=1.4,creator=me
  cbz:  resolution=144,colorspace=gray,start=1
  pnm:  resolution=300,colorspace=rgb";

/// A document description as found in the JSON input.
#[derive(Deserialize)]
struct DocSpec {
    pages: Vec<PageSpec>,
}

#[derive(Deserialize)]
struct PageSpec {
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default = "default_height")]
    height: f32,
    #[serde(default)]
    rects: Vec<RectSpec>,
    #[serde(default)]
    texts: Vec<TextSpec>,
    #[serde(default)]
    images: Vec<ImageSpec>,
}

#[derive(Deserialize)]
struct RectSpec {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    #[serde(default)]
    color: [f32; 3],
    #[serde(default = "default_alpha")]
    alpha: f32,
}

#[derive(Deserialize)]
struct TextSpec {
    text: String,
    x: f32,
    y: f32,
    #[serde(default = "default_font")]
    font: String,
    #[serde(default = "default_size")]
    size: f32,
}

#[derive(Deserialize)]
struct ImageSpec {
    file: PathBuf,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

fn default_width() -> f32 {
    595.0
}

fn default_height() -> f32 {
    842.0
}

fn default_alpha() -> f32 {
    1.0
}

fn default_font() -> String {
    "Helvetica".to_string()
}

fn default_size() -> f32 {
    12.0
}

struct Config {
    output: PathBuf,
    format: Option<Format>,
    options: String,
    input: Option<PathBuf>,
    ocr: bool,
}

impl Config {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut format = None;
        let mut options = String::new();
        let mut input = None;
        let mut ocr = false;
        let mut output = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--format" => {
                    i += 1;
                    let value = args.get(i).ok_or("--format needs a value")?;
                    format = Some(value.parse::<Format>().map_err(|e| e.to_string())?);
                },
                "--options" => {
                    i += 1;
                    options = args.get(i).ok_or("--options needs a value")?.clone();
                },
                "--input" => {
                    i += 1;
                    input = Some(PathBuf::from(args.get(i).ok_or("--input needs a value")?));
                },
                "--ocr" => {
                    ocr = true;
                },
                "--help" | "-h" => {
                    return Err(USAGE.to_string());
                },
                other if other.starts_with('-') => {
                    return Err(format!("unknown flag: {}", other));
                },
                other => {
                    if output.is_some() {
                        return Err("exactly one output path expected".to_string());
                    }
                    output = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        Ok(Self {
            output: output.ok_or("no output path given")?,
            format,
            options,
            input,
            ocr,
        })
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Built-in document used when no --input is given.
fn sample_doc() -> DocSpec {
    DocSpec {
        pages: vec![
            PageSpec {
                width: 595.0,
                height: 842.0,
                rects: vec![
                    RectSpec {
                        x: 72.0,
                        y: 700.0,
                        w: 451.0,
                        h: 60.0,
                        color: [0.13, 0.33, 0.65],
                        alpha: 1.0,
                    },
                    RectSpec {
                        x: 72.0,
                        y: 640.0,
                        w: 451.0,
                        h: 40.0,
                        color: [0.9, 0.55, 0.1],
                        alpha: 0.5,
                    },
                ],
                texts: vec![
                    TextSpec {
                        text: "Pagepress sample document".to_string(),
                        x: 72.0,
                        y: 600.0,
                        font: "Helvetica".to_string(),
                        size: 18.0,
                    },
                    TextSpec {
                        text: "Page one of two".to_string(),
                        x: 72.0,
                        y: 570.0,
                        font: "Helvetica".to_string(),
                        size: 12.0,
                    },
                ],
                images: Vec::new(),
            },
            PageSpec {
                width: 595.0,
                height: 842.0,
                rects: vec![RectSpec {
                    x: 200.0,
                    y: 300.0,
                    w: 195.0,
                    h: 195.0,
                    color: [0.2, 0.6, 0.3],
                    alpha: 1.0,
                }],
                texts: vec![TextSpec {
                    text: "Page two of two".to_string(),
                    x: 72.0,
                    y: 770.0,
                    font: "Helvetica".to_string(),
                    size: 12.0,
                }],
                images: Vec::new(),
            },
        ],
    }
}

#[cfg(feature = "ocr")]
fn attach_ocr(
    writer: &mut DocumentWriter<std::io::BufWriter<std::fs::File>>,
) -> Result<(), Box<dyn std::error::Error>> {
    use pagepress::OcrsRecognizer;

    let engine = OcrsRecognizer::with_cached_models()?;
    writer.set_ocr_engine(Box::new(engine))?;
    writer.set_ocr_listener(Box::new(|percent| {
        use std::io::Write;
        print!("\rocr: {:3}%", percent);
        let _ = std::io::stdout().flush();
        if percent == 100 {
            println!();
        }
        true
    }))?;
    Ok(())
}

#[cfg(not(feature = "ocr"))]
fn attach_ocr(
    _writer: &mut DocumentWriter<std::io::BufWriter<std::fs::File>>,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("this build has no OCR engine; rebuild with --features ocr".into())
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let format = match config.format {
        Some(format) => format,
        None => Format::from_path(&config.output)?,
    };

    // A .pgm path asks for the grayscale flavor of pnm
    let mut options = config.options.clone();
    if format == Format::Pnm
        && has_extension(&config.output, "pgm")
        && !options.contains("colorspace")
    {
        if !options.is_empty() {
            options.push(',');
        }
        options.push_str("colorspace=gray");
    }

    let doc: DocSpec = match &config.input {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => sample_doc(),
    };

    let mut writer = DocumentWriter::create(&config.output, format, &options)?;
    if config.ocr {
        attach_ocr(&mut writer)?;
    }

    for (index, page_spec) in doc.pages.iter().enumerate() {
        let mediabox = Rect::new(0.0, 0.0, page_spec.width, page_spec.height);
        let page = writer.begin_page(mediabox)?;

        for r in &page_spec.rects {
            let path = PathData::rect(r.x, r.y, r.w, r.h);
            let color = Color::rgb(r.color[0], r.color[1], r.color[2]);
            page.fill_path(path, FillRule::NonZero, color, r.alpha);
        }
        for t in &page_spec.texts {
            page.add_text(&t.text, t.x, t.y, &t.font, t.size);
        }
        for img in &page_spec.images {
            let image = ImageData::from_file(&img.file)?;
            page.draw_image(image, Rect::from_xywh(img.x, img.y, img.w, img.h), 1.0);
        }

        writer.end_page()?;
        println!("page {} written", index + 1);
    }

    let pages = writer.page_count();
    writer.close()?;
    for warning in writer.warnings() {
        eprintln!("warning: page {}: {}", warning.page_index + 1, warning.message);
    }

    let bytes = std::fs::metadata(&config.output)?.len();
    println!(
        "wrote {} ({} format, {} pages, {} bytes)",
        config.output.display(),
        format,
        pages,
        bytes
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let config = match Config::from_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!();
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        },
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}
