//! PDF object model and serialization.
//!
//! The writer only ever appends objects, so this is the write-side
//! subset of COS: object construction plus byte serialization per
//! ISO 32000-1 syntax rules. Dictionaries are kept in a `BTreeMap` so
//! output is deterministic without a sort pass.

use std::collections::BTreeMap;
use std::io::Write;

use bytes::Bytes;

/// Dictionary body, ordered by key.
pub(crate) type Dict = BTreeMap<String, Object>;

/// Reference to an indirect object.
///
/// The writer never rewrites objects, so generation numbers are always
/// zero and only the object number is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ObjectRef {
    /// Object number
    pub id: u32,
}

impl ObjectRef {
    pub(crate) fn new(id: u32) -> Self {
        Self { id }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 R", self.id)
    }
}

/// A PDF object.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Object {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f32),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (written with a leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary
    Dictionary(Dict),
    /// Stream (dictionary plus data; /Length is filled in on write)
    Stream {
        /// Stream dictionary, without /Length
        dict: Dict,
        /// Raw stream data, already filtered
        data: Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

impl Object {
    /// A name object from a string slice.
    pub(crate) fn name(n: &str) -> Self {
        Object::Name(n.to_string())
    }

    /// A string object from text.
    pub(crate) fn text(s: &str) -> Self {
        Object::String(s.as_bytes().to_vec())
    }

    /// A dictionary object from key/value pairs.
    pub(crate) fn dict<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Object)>,
    {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// An array of real numbers, e.g. a rectangle or matrix.
    pub(crate) fn reals<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        Object::Array(values.into_iter().map(Object::Real).collect())
    }

    /// Serialize this object into `w`.
    pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self {
            Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => write_real(w, *r),
            Object::String(s) => write_string(w, s),
            Object::Name(n) => write_name(w, n),
            Object::Array(arr) => {
                write!(w, "[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(w, " ")?;
                    }
                    obj.write_to(w)?;
                }
                write!(w, "]")
            },
            Object::Dictionary(dict) => write_dict(w, dict),
            Object::Stream { dict, data } => {
                let mut with_length = dict.clone();
                with_length.insert("Length".to_string(), Object::Integer(data.len() as i64));
                write_dict(w, &with_length)?;
                write!(w, "\nstream\n")?;
                w.write_all(data)?;
                write!(w, "\nendstream")
            },
            Object::Reference(r) => write!(w, "{}", r),
        }
    }
}

/// Serialize an indirect object definition.
///
/// Format: `{id} 0 obj\n{object}\nendobj\n`
pub(crate) fn write_indirect<W: Write>(w: &mut W, id: u32, obj: &Object) -> std::io::Result<()> {
    writeln!(w, "{} 0 obj", id)?;
    obj.write_to(w)?;
    write!(w, "\nendobj\n")
}

/// Write a real number. `Display` for floats is the shortest decimal
/// that round-trips, so integral values come out bare ("612", not
/// "612.0") and nothing gains noise digits.
fn write_real<W: Write>(w: &mut W, value: f32) -> std::io::Result<()> {
    write!(w, "{}", value)
}

/// Write a PDF string: literal `(...)` when printable, hex `<...>`
/// otherwise.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    let is_printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if is_printable {
        write!(w, "(")?;
        for &byte in data {
            match byte {
                b'(' => write!(w, "\\(")?,
                b')' => write!(w, "\\)")?,
                b'\\' => write!(w, "\\\\")?,
                b'\n' => write!(w, "\\n")?,
                b'\r' => write!(w, "\\r")?,
                b'\t' => write!(w, "\\t")?,
                _ => w.write_all(&[byte])?,
            }
        }
        write!(w, ")")
    } else {
        write!(w, "<")?;
        for byte in data {
            write!(w, "{:02X}", byte)?;
        }
        write!(w, ">")
    }
}

/// Write a PDF name, escaping delimiters and non-regular bytes as `#xx`.
fn write_name<W: Write>(w: &mut W, name: &str) -> std::io::Result<()> {
    write!(w, "/")?;
    for byte in name.bytes() {
        let regular = (0x21..=0x7E).contains(&byte)
            && !matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#');
        if regular {
            w.write_all(&[byte])?;
        } else {
            write!(w, "#{:02X}", byte)?;
        }
    }
    Ok(())
}

fn write_dict<W: Write>(w: &mut W, dict: &Dict) -> std::io::Result<()> {
    write!(w, "<<")?;
    for (key, value) in dict {
        write!(w, " ")?;
        write_name(w, key)?;
        write!(w, " ")?;
        value.write_to(w)?;
    }
    write!(w, " >>")
}
