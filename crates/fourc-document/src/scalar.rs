//! # Scalars
//!
//! Plain scalars resolve through the YAML 1.2 core schema: `null`/`~`/empty
//! are null, `true`/`false` in the three usual spellings are booleans,
//! decimal, octal (`0o`) and hex (`0x`) integers are integers, and anything
//! else that looks numeric (`1e-6`, `.5`, `.inf`, `.nan`) is a float. Quoted
//! scalars are always strings.
//!
//! Generated text is chosen so that resolving it yields the same value
//! again: strings that would resolve to something else, or that contain
//! indicator characters, are written double-quoted.

use std::borrow::Cow;
use std::fmt::{self, Write};

/// A resolved scalar value.
#[derive(Debug, Clone)]
pub enum Scalar {
    /// `null`, `~`, or an empty value.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer that fits in `i64`.
    Integer(i64),
    /// A float, including the special values.
    Float(f64),
    /// A string.
    String(String),
}

impl Scalar {
    /// Structural equality. Floats compare bitwise so that `.nan` equals
    /// itself; everything else compares by value.
    pub fn same(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => false,
        }
    }

    /// True for [`Scalar::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Short name of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Integer(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }

    /// The value as text: strings verbatim, everything else rendered.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.render()),
        }
    }

    /// Render the value as YAML text that resolves back to it.
    pub fn render(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => render_float(*f),
            Scalar::String(s) => render_string(s),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Integer(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

/// Resolve an unquoted scalar token.
pub fn resolve_plain(text: &str) -> Scalar {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Scalar::Null,
        "true" | "True" | "TRUE" => return Scalar::Bool(true),
        "false" | "False" | "FALSE" => return Scalar::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Scalar::Float(f64::INFINITY)
        }
        "-.inf" | "-.Inf" | "-.INF" => return Scalar::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Scalar::Float(f64::NAN),
        _ => {}
    }

    if let Some(hex) = text.strip_prefix("0x") {
        if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(i) = i64::from_str_radix(hex, 16) {
                return Scalar::Integer(i);
            }
        }
    }
    if let Some(oct) = text.strip_prefix("0o") {
        if !oct.is_empty() && oct.chars().all(|c| ('0'..='7').contains(&c)) {
            if let Ok(i) = i64::from_str_radix(oct, 8) {
                return Scalar::Integer(i);
            }
        }
    }

    if is_decimal_int(text) {
        return match text.parse::<i64>() {
            Ok(i) => Scalar::Integer(i),
            // Too large for i64: keep the magnitude as a float.
            Err(_) => text
                .parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or_else(|_| Scalar::String(text.to_string())),
        };
    }

    if is_core_float(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Scalar::Float(f);
        }
    }

    Scalar::String(text.to_string())
}

fn is_decimal_int(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`
fn is_core_float(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some(("", frac)) => !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()),
        Some((int, frac)) => {
            !int.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.bytes().all(|b| b.is_ascii_digit()),
    };

    let exponent_ok = match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
    };

    mantissa_ok && exponent_ok
}

fn render_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f == f64::INFINITY {
        ".inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else {
        // Debug keeps a decimal point or exponent, so the text stays a float.
        format!("{f:?}")
    }
}

fn render_string(s: &str) -> String {
    if is_plain_safe(s) {
        s.to_string()
    } else {
        quote(s)
    }
}

/// Double-quoted form of `s`. Characters outside YAML's printable set, and
/// those a YAML 1.1 reader treats as line breaks, are written as escapes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if needs_escape(c) => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// C0 and C1 controls, DEL, the byte order mark, the non-characters
/// U+FFFE/U+FFFF, and the Unicode line and paragraph separators.
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}' | '\u{FFFE}' | '\u{FFFF}')
}

/// True if `s` can be written as a plain scalar, in block or flow context,
/// and read back as the same string.
pub fn is_plain_safe(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return false;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return false;
    }
    // Read as a document marker at column 0.
    if s.starts_with("...") {
        return false;
    }
    if s.chars()
        .any(|c| needs_escape(c) || matches!(c, ',' | '[' | ']' | '{' | '}'))
    {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    matches!(resolve_plain(s), Scalar::String(_))
}

/// Decode a quoted scalar token, quotes included.
pub(crate) fn decode_quoted(raw: &str) -> Result<String, String> {
    if let Some(inner) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        return Ok(inner.replace("''", "'"));
    }
    serde_yaml::from_str::<String>(raw).map_err(|e| format!("invalid double-quoted scalar: {e}"))
}

/// Byte length of the quoted token at the start of `s`, closing quote
/// included, or `None` if the quote is not closed on this line.
pub(crate) fn quoted_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let quote = *bytes.first()?;
    let mut i = 1;
    while i < bytes.len() {
        let b = bytes[i];
        if quote == b'"' && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_null_and_bool() {
        for text in ["", "~", "null", "Null", "NULL"] {
            assert_eq!(resolve_plain(text), Scalar::Null, "{text}");
        }
        assert_eq!(resolve_plain("True"), Scalar::Bool(true));
        assert_eq!(resolve_plain("FALSE"), Scalar::Bool(false));
        assert_eq!(resolve_plain("yes"), Scalar::String("yes".into()));
    }

    #[test]
    fn test_resolve_integers() {
        assert_eq!(resolve_plain("42"), Scalar::Integer(42));
        assert_eq!(resolve_plain("-7"), Scalar::Integer(-7));
        assert_eq!(resolve_plain("+3"), Scalar::Integer(3));
        assert_eq!(resolve_plain("0x1F"), Scalar::Integer(31));
        assert_eq!(resolve_plain("0o17"), Scalar::Integer(15));
        assert!(matches!(
            resolve_plain("99999999999999999999"),
            Scalar::Float(_)
        ));
    }

    #[test]
    fn test_resolve_floats() {
        assert_eq!(resolve_plain("1e-6"), Scalar::Float(1e-6));
        assert_eq!(resolve_plain("2.5"), Scalar::Float(2.5));
        assert_eq!(resolve_plain(".5"), Scalar::Float(0.5));
        assert_eq!(resolve_plain("1."), Scalar::Float(1.0));
        assert_eq!(resolve_plain("-1.5E+3"), Scalar::Float(-1500.0));
        assert_eq!(resolve_plain("-.inf"), Scalar::Float(f64::NEG_INFINITY));
        assert!(matches!(resolve_plain(".nan"), Scalar::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_resolve_strings() {
        for text in ["abc", "1.2.3", "e5", "1e", ".", "0x", "NODE COORDS", "inf"] {
            assert_eq!(resolve_plain(text), Scalar::String(text.into()), "{text}");
        }
    }

    #[test]
    fn test_render_round_trips_through_resolve() {
        let values = [
            Scalar::Null,
            Scalar::Bool(true),
            Scalar::Integer(-12),
            Scalar::Float(1e-6),
            Scalar::Float(3.0),
            Scalar::Float(f64::INFINITY),
            Scalar::String("plain text".into()),
            Scalar::String("1.0".into()),
            Scalar::String("true".into()),
            Scalar::String("a: b".into()),
            Scalar::String("".into()),
            Scalar::String("- item".into()),
        ];
        for value in values {
            let text = value.render();
            let back = if text.starts_with('"') {
                Scalar::String(decode_quoted(&text).unwrap())
            } else {
                resolve_plain(&text)
            };
            assert_eq!(back, value, "rendered as {text}");
        }
    }

    #[test]
    fn test_nan_is_same_as_itself() {
        assert!(Scalar::Float(f64::NAN).same(&Scalar::Float(f64::NAN)));
        assert_eq!(Scalar::Float(f64::NAN).render(), ".nan");
    }

    #[test]
    fn test_decode_quoted() {
        assert_eq!(decode_quoted("'it''s'").unwrap(), "it's");
        assert_eq!(decode_quoted(r#""a\tb""#).unwrap(), "a\tb");
        assert_eq!(decode_quoted(r#""""#).unwrap(), "");
    }

    #[test]
    fn test_quoted_len() {
        assert_eq!(quoted_len(r#""a\"b" rest"#), Some(6));
        assert_eq!(quoted_len("'it''s': x"), Some(7));
        assert_eq!(quoted_len("\"open"), None);
    }

    #[test]
    fn test_plain_safety() {
        assert!(is_plain_safe("STRUCTURAL DYNAMIC"));
        assert!(is_plain_safe("file.yaml"));
        assert!(!is_plain_safe("42"));
        assert!(!is_plain_safe("[x]"));
        assert!(!is_plain_safe(" lead"));
        assert!(!is_plain_safe("a #b"));
        assert!(!is_plain_safe("line\nbreak"));
        assert!(!is_plain_safe("... x"));
        assert!(!is_plain_safe("a\u{85}b"));
        assert!(!is_plain_safe("a\u{2028}b"));
    }

    #[test]
    fn test_quote_escapes_non_printable() {
        assert_eq!(quote("a\u{7f}b"), r#""a\u007Fb""#);
        assert_eq!(quote("\u{9c}"), r#""\u009C""#);
        assert_eq!(quote("x\u{85}y\u{2028}"), r#""x\u0085y\u2028""#);
        assert_eq!(quote("tab\tquote\"\\"), r#""tab\tquote\"\\""#);
        assert_eq!(quote("\u{1}é"), r#""\u0001é""#);
        for s in ["a\u{7f}b", "\u{9c}", "x\u{85}y\u{2028}", "\u{feff}", "\u{1}é"] {
            assert_eq!(decode_quoted(&quote(s)).unwrap(), s);
        }
    }
}
