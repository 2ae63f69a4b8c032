use std::borrow::Cow;

use saphyr::{Scalar, Yaml};

/// Builds a string key for looking up a field in a YAML mapping.
pub fn key(name: &str) -> Yaml<'_> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

/// Textual form of a scalar node, `None` for sequences and mappings.
///
/// YAML resolves `true`, `42` and `~` to typed scalars, so they are turned
/// back into the text a script author wrote.
pub fn scalar_text(value: &Yaml) -> Option<String> {
    let Yaml::Value(scalar) = value else {
        return None;
    };
    match scalar {
        Scalar::String(text) => Some(text.to_string()),
        Scalar::Boolean(flag) => Some(flag.to_string()),
        Scalar::Integer(number) => Some(number.to_string()),
        Scalar::Null => Some("null".to_string()),
        _ => None,
    }
}

pub fn is_null(value: &Yaml) -> bool {
    matches!(value, Yaml::Value(Scalar::Null))
}
