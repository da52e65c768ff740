//! `{name}` placeholder substitution.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Named interpolation parameters.
///
/// A `BTreeMap` keeps serialization key-ordered, so two maps with the same
/// content always produce the same result-cache key.
pub type Params = BTreeMap<String, ParamValue>;

/// A single interpolation value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// One-letter variant tag used when a value must be told apart from a
    /// value of another kind with the same display form.
    pub(crate) const fn type_tag(&self) -> char {
        match self {
            Self::Text(_) => 's',
            Self::Integer(_) => 'i',
            Self::Float(_) => 'f',
            Self::Bool(_) => 'b',
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) if n.is_nan() => f.write_str("NaN"),
            Self::Float(n) if n.is_infinite() => {
                f.write_str(if n.is_sign_positive() { "Infinity" } else { "-Infinity" })
            }
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for ParamValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Integer)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Builds a [`Params`] map.
///
/// ```
/// use i18n_engine::params;
///
/// let params = params! { "name" => "Alice", "count" => 3 };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::interpolate::Params::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::interpolate::Params::new();
        $(params.insert(::std::string::String::from($name), $crate::interpolate::ParamValue::from($value));)+
        params
    }};
}

/// Placeholder names are ASCII word characters.
const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces `{name}` placeholders in `template` with values from `params`.
///
/// Placeholders without a matching parameter are left as-is. With `escape`
/// set, substituted values are HTML-escaped; the template text never is.
/// Without a parameter map the template is returned unchanged.
#[must_use]
pub fn interpolate(template: &str, params: Option<&Params>, escape: bool) -> String {
    let Some(params) = params else {
        return template.to_string();
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (before, from_brace) = rest.split_at(open);
        out.push_str(before);

        let tail = from_brace.strip_prefix('{').unwrap_or(from_brace);
        let name_len = tail.find(|c: char| !is_word_char(c)).unwrap_or(tail.len());
        let (name, remainder) = tail.split_at(name_len);

        match remainder.strip_prefix('}') {
            Some(after_close) if !name.is_empty() => {
                match params.get(name) {
                    Some(value) if escape => out.push_str(&escape_html(&value.to_string())),
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = after_close;
            }
            _ => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Replaces `& < > " '` with their HTML entities.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
