//! Case-insensitive header collection.
//!
//! Field names are matched on their lowercase form. Setting a name that is
//! already present joins the values with `", "` in the order they arrive, the
//! same rule the wire parser applies to repeated header lines.
//!
//! ```
//! # use rawhttp::http::headers::Headers;
//! let mut headers = Headers::new();
//! headers.set("Accept", "text/html");
//! headers.set("accept", "text/plain");
//! assert_eq!(headers.get("ACCEPT"), Some("text/html, text/plain"));
//! ```

use crate::http::error::HeaderError;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    /// Lowercased name, the identity of the field.
    key: String,
    /// Spelling used the first time the field was inserted; written on the wire.
    name: String,
    value: String,
}

/// HTTP header fields keyed by lowercase name.
///
/// Iteration yields fields in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<Field>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses at most one CRLF-terminated header line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line ending
    /// the header section was reached. `(0, false)` means no complete line is
    /// buffered yet. On error nothing is consumed.
    pub fn parse_line(&mut self, data: &[u8]) -> Result<(usize, bool), HeaderError> {
        let Some(end) = find_crlf(data) else {
            return Ok((0, false));
        };

        if end == 0 {
            return Ok((CRLF.len(), true));
        }

        let raw = &data[..end];
        let line = std::str::from_utf8(raw)
            .map_err(|_| HeaderError::format(String::from_utf8_lossy(raw)))?
            .trim();

        let (key, value) = line.split_once(':').ok_or_else(|| HeaderError::format(line))?;

        if key.contains(' ') {
            return Err(HeaderError::format(line));
        }

        if !is_token(key) {
            return Err(HeaderError::invalid_key(key));
        }

        self.insert_joined(key, value.trim());

        Ok((end + CRLF.len(), false))
    }

    /// Adds a value, joining it onto any existing value for the same name.
    pub fn set(&mut self, key: &str, value: &str) {
        self.insert_joined(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.find(key).map(|f| f.value.as_str())
    }

    /// Replaces any existing value for `key` unconditionally.
    pub fn replace(&mut self, key: &str, value: &str) {
        let lower = key.to_ascii_lowercase();
        match self.fields.iter_mut().find(|f| f.key == lower) {
            Some(field) => {
                field.name = key.to_string();
                field.value = value.to_string();
            }
            None => self.fields.push(Field {
                key: lower,
                name: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let lower = key.to_ascii_lowercase();
        let idx = self.fields.iter().position(|f| f.key == lower)?;
        Some(self.fields.remove(idx).value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(name, value)` pairs, with names as first spelled.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.value.as_str()))
    }

    /// Serializes every field as `name: value\r\n`, followed by the blank line.
    pub(crate) fn to_wire(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (name, value) in self.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        buf.extend_from_slice(CRLF);
        buf
    }

    fn find(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key.eq_ignore_ascii_case(key))
    }

    fn insert_joined(&mut self, key: &str, value: &str) {
        let lower = key.to_ascii_lowercase();
        match self.fields.iter_mut().find(|f| f.key == lower) {
            Some(field) if !field.value.is_empty() => {
                field.value.push_str(", ");
                field.value.push_str(value);
            }
            Some(field) => field.value = value.to_string(),
            None => self.fields.push(Field {
                key: lower,
                name: key.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

/// RFC 9110 `token`: letters, digits and ``!#$%&'*+-.^_`|~``.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^'
                        | b'_' | b'`' | b'|' | b'~'
                )
        })
}
