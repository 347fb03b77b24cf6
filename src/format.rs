//! Output format selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The document formats a writer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Paginated PDF with vector content and optional hidden OCR text.
    Pdf,
    /// Comic book archive: a ZIP file holding one PNG per page.
    Cbz,
    /// Concatenated NetPBM frames (binary P6 color or P5 grayscale).
    Pnm,
    /// Plain text, one form feed between pages.
    Text,
}

impl Format {
    /// Canonical lowercase name, as accepted by [`Format::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Cbz => "cbz",
            Format::Pnm => "pnm",
            Format::Text => "text",
        }
    }

    /// Guess a format from a file path's extension.
    ///
    /// Recognizes the same aliases as [`Format::from_str`]. Comparison
    /// is case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::Format;
    ///
    /// assert_eq!(Format::from_path("out/scan.CBZ").unwrap(), Format::Cbz);
    /// assert_eq!(Format::from_path("page.pgm").unwrap(), Format::Pnm);
    /// assert!(Format::from_path("notes.docx").is_err());
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
            .map_err(|_| Error::UnsupportedFormat(path.display().to_string()))
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Parse a format name. Aliases: `ppm` and `pgm` for `pnm`, `txt`
    /// for `text`. Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "cbz" => Ok(Format::Cbz),
            "pnm" | "ppm" | "pgm" => Ok(Format::Pnm),
            "text" | "txt" => Ok(Format::Text),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        assert_eq!("pdf".parse::<Format>().unwrap(), Format::Pdf);
        assert_eq!("cbz".parse::<Format>().unwrap(), Format::Cbz);
        assert_eq!("pnm".parse::<Format>().unwrap(), Format::Pnm);
        assert_eq!("text".parse::<Format>().unwrap(), Format::Text);
    }

    #[test]
    fn test_parse_aliases_and_case() {
        assert_eq!("PPM".parse::<Format>().unwrap(), Format::Pnm);
        assert_eq!("pgm".parse::<Format>().unwrap(), Format::Pnm);
        assert_eq!("TXT".parse::<Format>().unwrap(), Format::Text);
        assert_eq!(" Pdf ".parse::<Format>().unwrap(), Format::Pdf);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "docx".parse::<Format>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(name) if name == "docx"));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path("a/b/report.pdf").unwrap(), Format::Pdf);
        assert_eq!(Format::from_path("scan.cbz").unwrap(), Format::Cbz);
        assert!(Format::from_path("no_extension").is_err());
        assert!(Format::from_path("archive.tar.gz").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for format in [Format::Pdf, Format::Cbz, Format::Pnm, Format::Text] {
            assert_eq!(format.to_string().parse::<Format>().unwrap(), format);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Format::Cbz).unwrap();
        assert_eq!(json, "\"cbz\"");
        let back: Format = serde_json::from_str("\"pnm\"").unwrap();
        assert_eq!(back, Format::Pnm);
    }
}
