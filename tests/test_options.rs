//! Option string handling through the public constructors.
//!
//! Regular tests pin the per-format acceptance grids; property tests
//! check the option surface never panics and treats equivalent
//! spellings alike.

use std::io::Cursor;

use proptest::prelude::*;

use pagepress::options::OptionsMap;
use pagepress::{DocumentWriter, Format};

fn accepts(format: Format, options: &str) -> bool {
    DocumentWriter::from_sink(Cursor::new(Vec::new()), format, options).is_ok()
}

mod grid_tests {
    use super::*;

    #[test]
    fn test_pdf_options() {
        for good in [
            "",
            "compress",
            "compress=yes",
            "compress=no",
            "compress=flate",
            "version=1.3",
            "version=2.0",
            "creator=me,producer=someone else",
            "compress, version=1.4",
            ",,compress,,",
        ] {
            assert!(accepts(Format::Pdf, good), "pdf should accept {:?}", good);
        }
        for bad in [
            "compress=perhaps",
            "version=1.8",
            "version=3",
            "version=latest",
            "resolution=96",
            "=x",
        ] {
            assert!(!accepts(Format::Pdf, bad), "pdf should reject {:?}", bad);
        }
    }

    #[test]
    fn test_raster_options() {
        for format in [Format::Cbz, Format::Pnm] {
            for good in [
                "",
                "resolution=18",
                "resolution=96.5",
                "resolution=2400",
                "colorspace=gray",
                "colorspace=grey",
                "colorspace=rgb",
            ] {
                assert!(accepts(format, good), "{} should accept {:?}", format, good);
            }
            for bad in [
                "resolution=17",
                "resolution=2401",
                "resolution=abc",
                "resolution=-96",
                "colorspace=cmyk",
                "compress",
            ] {
                assert!(!accepts(format, bad), "{} should reject {:?}", format, bad);
            }
        }

        // The entry numbering option only exists for archives.
        assert!(accepts(Format::Cbz, "start=12"));
        assert!(!accepts(Format::Pnm, "start=12"));
    }

    #[test]
    fn test_text_takes_no_options() {
        assert!(accepts(Format::Text, ""));
        assert!(accepts(Format::Text, " , ,"));
        assert!(!accepts(Format::Text, "resolution=96"));
        assert!(!accepts(Format::Text, "compress"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        // Only the last occurrence of a key is read, so an earlier bad
        // value is shadowed and a later one rejects.
        assert!(accepts(Format::Pdf, "version=1.8,version=1.4"));
        assert!(!accepts(Format::Pdf, "version=1.4,version=1.8"));
    }
}

proptest! {
    /// Arbitrary option strings never panic any constructor; they are
    /// either accepted or rejected with an error.
    #[test]
    fn prop_arbitrary_options_never_panic(options in ".{0,120}") {
        for format in [Format::Pdf, Format::Cbz, Format::Pnm, Format::Text] {
            let _ = DocumentWriter::from_sink(Cursor::new(Vec::new()), format, &options);
        }
    }
}

proptest! {
    /// Whitespace around keys, values, and separators is immaterial.
    #[test]
    fn prop_whitespace_immaterial(resolution in 18u32..=2400u32) {
        let plain = format!("resolution={}", resolution);
        let spaced = format!("  resolution = {} , ", resolution);
        prop_assert!(accepts(Format::Pnm, &plain));
        prop_assert!(accepts(Format::Pnm, &spaced));
    }
}

proptest! {
    /// Parsing preserves every well-formed pair, with the bare-key
    /// shorthand expanding to "yes".
    #[test]
    fn prop_parse_retains_pairs(
        keys in prop::collection::vec("[a-z]{1,12}", 1..6),
        value in "[a-z0-9.]{0,8}",
    ) {
        prop_assume!(keys.iter().all(|k| k != "flag"));
        let raw = keys
            .iter()
            .map(|k| format!("{}={}", k, value))
            .chain(std::iter::once("flag".to_string()))
            .collect::<Vec<_>>()
            .join(",");

        let opts = OptionsMap::parse(&raw).unwrap();
        for key in &keys {
            prop_assert_eq!(opts.get(key), Some(value.as_str()));
        }
        prop_assert_eq!(opts.get("flag"), Some("yes"));
    }
}
