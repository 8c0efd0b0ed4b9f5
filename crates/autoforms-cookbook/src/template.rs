//! `{{token}}` placeholders in step values.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use autoforms_protocols::types::UserData;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("valid token regex")
});

/// Substitute `{{name}}` tokens from `data`. Unknown tokens are left as-is.
pub fn resolve_tokens<'a>(value: &'a str, data: &UserData) -> Cow<'a, str> {
    TOKEN.replace_all(value, |caps: &Captures<'_>| match data.get(&caps[1]) {
        Some(v) => v.clone(),
        None => caps[0].to_string(),
    })
}

/// Replace a typed literal with `{{field}}` when it equals a user-data value.
///
/// The first field (in key order) whose value is exactly `value` wins.
pub fn templatize(value: &str, data: &UserData) -> String {
    if value.is_empty() {
        return value.to_string();
    }
    data.iter()
        .find(|(_, v)| v.as_str() == value)
        .map(|(k, _)| format!("{{{{{}}}}}", k))
        .unwrap_or_else(|| value.to_string())
}
