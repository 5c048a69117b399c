//! # Canonical JSON
//!
//! RFC 8785 (JSON Canonicalization Scheme) serialization of the request
//! envelope that gets signed for authorization-required wallet calls.
//!
//! The remote API runs its own canonicalizer over the request it receives and
//! checks our signature against those bytes, so the output here has to match
//! the RFC exactly:
//!
//! 1. Object members sorted by the UTF-16 code units of their names, at every depth
//! 2. Arrays keep their order
//! 3. No whitespace outside string values
//! 4. Numbers printed with the ECMAScript `Number.prototype.toString` algorithm
//! 5. Strings escape only `"`, `\` and control characters
//!
//! ```rust
//! use privy_rs::canonical::canonicalize;
//!
//! let value = serde_json::json!({"b": 1, "a": [true, null, 4.50]});
//! assert_eq!(canonicalize(&value), br#"{"a":[true,null,4.5],"b":1}"#.to_vec());
//! ```

use serde::Serialize;
use serde_json::{json, Number, Value};

use crate::config::HEADER_PRIVY_APP_ID;
use crate::Error;

/// Version tag carried in every signing envelope.
pub const SIGNING_ENVELOPE_VERSION: u32 = 1;

/// The request description that is canonicalized and signed to authorize a
/// delegated wallet action.
///
/// Built fresh for each call; the header subset always holds exactly the
/// `privy-app-id` header.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningEnvelope {
    method: String,
    url: String,
    body: Value,
    app_id: String,
}

impl SigningEnvelope {
    /// Builds an envelope for `method url` with an optional JSON body.
    ///
    /// An absent body is encoded as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if `body` cannot be represented as a JSON value.
    pub fn new<T>(method: &str, url: &str, body: Option<&T>, app_id: &str) -> Result<Self, Error>
    where
        T: Serialize + ?Sized,
    {
        let body = match body {
            Some(body) => serde_json::to_value(body).map_err(|e| Error::encoding(e.to_string()))?,
            None => Value::Null,
        };

        Ok(Self {
            method: method.to_string(),
            url: url.to_string(),
            body,
            app_id: app_id.to_string(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The envelope as a plain JSON value.
    pub fn to_value(&self) -> Value {
        json!({
            "version": SIGNING_ENVELOPE_VERSION,
            "method": self.method,
            "url": self.url,
            "body": self.body,
            "headers": {
                HEADER_PRIVY_APP_ID: self.app_id,
            },
        })
    }

    /// The RFC 8785 bytes that get signed.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        canonicalize(&self.to_value())
    }
}

/// Serializes `value` and returns its canonical form.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if `value` cannot be represented as JSON.
pub fn to_canonical_vec<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value).map_err(|e| Error::encoding(e.to_string()))?;
    Ok(canonicalize(&value))
}

/// Returns the canonical bytes of a JSON value.
pub fn canonicalize(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(128);
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => out.extend_from_slice(format_number(n).as_bytes()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            members.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));

            out.push(b'{');
            for (i, (name, member)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(out, name);
                out.push(b':');
                write_value(out, member);
            }
            out.push(b'}');
        }
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            '\t' => out.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

/// JSON numbers are IEEE-754 doubles on the wire, so integers are printed
/// through their `f64` value as well.
fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(value) => format_f64(value),
        None => n.to_string(),
    }
}

/// ECMAScript `Number.prototype.toString` for finite doubles, including its
/// round-half-even choice between two equally short digit strings.
fn format_f64(value: f64) -> String {
    if value == 0.0 {
        // also covers -0
        return "0".to_string();
    }
    ryu_js::Buffer::new().format_finite(value).to_string()
}
