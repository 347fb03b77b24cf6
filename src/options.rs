//! Backend option strings.
//!
//! Writers are configured with a single `"key=value,key2,key3=value"`
//! string, matching the option language of command-line converters. A
//! bare key is shorthand for `key=yes`. Keys are validated by the
//! chosen backend at construction time, so a typo fails fast instead of
//! being silently ignored.

use crate::error::{Error, Result};

/// A parsed option string.
///
/// Parsing only checks syntax; key validation happens when a backend
/// resolves its typed options. When a key is given more than once the
/// last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsMap {
    entries: Vec<(String, String)>,
}

impl OptionsMap {
    /// Parse a `"key=value,..."` string.
    ///
    /// Whitespace around keys and values is trimmed; empty items (from
    /// stray commas) are skipped. An empty string yields an empty map.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::options::OptionsMap;
    ///
    /// let opts = OptionsMap::parse("resolution=150, colorspace=gray").unwrap();
    /// assert_eq!(opts.get("resolution"), Some("150"));
    /// assert_eq!(opts.get("colorspace"), Some("gray"));
    ///
    /// // A bare key means "yes"
    /// let opts = OptionsMap::parse("compress").unwrap();
    /// assert_eq!(opts.get("compress"), Some("yes"));
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            match item.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(Error::InvalidOption {
                            key: item.to_string(),
                            reason: "empty option key".to_string(),
                        });
                    }
                    entries.push((key.to_string(), value.trim().to_string()));
                },
                None => entries.push((item.to_string(), "yes".to_string())),
            }
        }
        Ok(Self { entries })
    }

    /// Look up a key; the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over all keys in order of appearance.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Whether no options were given.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Error for a key the chosen backend does not recognize.
pub(crate) fn unknown_key(format: &str, key: &str) -> Error {
    Error::InvalidOption {
        key: key.to_string(),
        reason: format!("not a recognized option for {} output", format),
    }
}

/// Parse a yes/no option value.
pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        other => Err(Error::InvalidOption {
            key: key.to_string(),
            reason: format!("expected yes or no, found '{}'", other),
        }),
    }
}

/// Parse a numeric option value, constrained to an inclusive range.
pub(crate) fn parse_f32_in(key: &str, value: &str, min: f32, max: f32) -> Result<f32> {
    let parsed: f32 = value.parse().map_err(|_| Error::InvalidOption {
        key: key.to_string(),
        reason: format!("expected a number, found '{}'", value),
    })?;
    if !parsed.is_finite() || parsed < min || parsed > max {
        return Err(Error::InvalidOption {
            key: key.to_string(),
            reason: format!("{} is outside the allowed range {}..={}", parsed, min, max),
        });
    }
    Ok(parsed)
}

/// Parse an unsigned integer option value.
pub(crate) fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| Error::InvalidOption {
        key: key.to_string(),
        reason: format!("expected a non-negative integer, found '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value_pairs() {
        let opts = OptionsMap::parse("compress=flate,version=1.7").unwrap();
        assert_eq!(opts.get("compress"), Some("flate"));
        assert_eq!(opts.get("version"), Some("1.7"));
        assert_eq!(opts.get("resolution"), None);
    }

    #[test]
    fn test_bare_key_means_yes() {
        let opts = OptionsMap::parse("compress").unwrap();
        assert_eq!(opts.get("compress"), Some("yes"));
    }

    #[test]
    fn test_empty_string_is_empty_map() {
        let opts = OptionsMap::parse("").unwrap();
        assert!(opts.is_empty());
    }

    #[test]
    fn test_whitespace_and_stray_commas() {
        let opts = OptionsMap::parse(" resolution = 300 ,, colorspace=gray ,").unwrap();
        assert_eq!(opts.get("resolution"), Some("300"));
        assert_eq!(opts.get("colorspace"), Some("gray"));
        assert_eq!(opts.keys().count(), 2);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let opts = OptionsMap::parse("resolution=96,resolution=300").unwrap();
        assert_eq!(opts.get("resolution"), Some("300"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = OptionsMap::parse("=gray").unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
    }

    #[test]
    fn test_empty_value_kept() {
        let opts = OptionsMap::parse("creator=").unwrap();
        assert_eq!(opts.get("creator"), Some(""));
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("compress", "yes").unwrap());
        assert!(!parse_bool("compress", "no").unwrap());
        assert!(parse_bool("compress", "maybe").is_err());
    }

    #[test]
    fn test_parse_f32_range() {
        assert_eq!(parse_f32_in("resolution", "300", 18.0, 2400.0).unwrap(), 300.0);
        assert!(parse_f32_in("resolution", "1", 18.0, 2400.0).is_err());
        assert!(parse_f32_in("resolution", "NaN", 18.0, 2400.0).is_err());
        assert!(parse_f32_in("resolution", "fast", 18.0, 2400.0).is_err());
    }

    #[test]
    fn test_parse_u32_values() {
        assert_eq!(parse_u32("start", "7").unwrap(), 7);
        assert!(parse_u32("start", "-1").is_err());
        assert!(parse_u32("start", "one").is_err());
    }
}
