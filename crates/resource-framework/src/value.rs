//! # Values & Request Context
//!
//! Attribute and meta values are plain [`serde_json::Value`]s, so anything a
//! domain type can serialize can be exposed as an attribute. This module adds
//! the request [`Context`] handed to every accessor, a total ordering over
//! values for in-memory sorting, and the key transforms applied on output.

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// An ordered attribute or meta map.
pub type ValueMap = Map<String, Value>;

/// Per-request context passed to every field accessor.
///
/// Carries scalar values (current user, locale, feature flags, ...) and typed
/// extensions such as a data snapshot that relationship accessors read from.
#[derive(Clone, Default)]
pub struct Context {
    values: BTreeMap<String, Value>,
    extensions: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a scalar value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Builder-style insert of a typed extension. One extension per type.
    pub fn with_extension<T: Any + Send + Sync>(mut self, extension: Arc<T>) -> Self {
        self.extensions.insert(TypeId::of::<T>(), extension);
        self
    }

    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|ext| ext.downcast_ref::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}

/// Renders a timestamp as an ISO-8601 string value.
pub fn iso8601<Tz>(timestamp: &DateTime<Tz>) -> Value
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    Value::String(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Short name of a value's JSON kind, used in error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over values: null < booleans < numbers < strings < arrays < objects.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// How member names are rewritten on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyTransform {
    #[default]
    Unaltered,
    /// `created_at` -> `createdAt`
    Camel,
    /// `created_at` -> `created-at`
    Dash,
    /// `createdAt` -> `created_at`
    Underscore,
}

impl KeyTransform {
    pub fn apply(self, key: &str) -> String {
        match self {
            KeyTransform::Unaltered => key.to_string(),
            KeyTransform::Camel => {
                let mut out = String::with_capacity(key.len());
                let mut upper_next = false;
                for ch in key.chars() {
                    if ch == '_' || ch == '-' {
                        upper_next = !out.is_empty();
                    } else if upper_next {
                        out.extend(ch.to_uppercase());
                        upper_next = false;
                    } else {
                        out.push(ch);
                    }
                }
                out
            }
            KeyTransform::Dash => split_words(key).join("-"),
            KeyTransform::Underscore => split_words(key).join("_"),
        }
    }
}

/// Splits on `_`, `-` and case changes. A run of capitals stays one word,
/// except that its last capital starts the next word when a lowercase letter
/// follows (`HTTPServer` -> `http`, `server`).
fn split_words(key: &str) -> Vec<String> {
    let chars: Vec<char> = key.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn context_holds_values_and_extensions() {
        struct Snapshot(u32);
        let ctx = Context::new()
            .with("locale", "en")
            .with_extension(Arc::new(Snapshot(7)));
        assert_eq!(ctx.get("locale"), Some(&json!("en")));
        assert_eq!(ctx.extension::<Snapshot>().map(|s| s.0), Some(7));
        assert!(ctx.extension::<String>().is_none());
    }

    #[test]
    fn timestamps_render_as_iso8601() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(iso8601(&ts), json!("2024-03-01T12:30:00Z"));
    }

    #[test]
    fn values_order_across_kinds() {
        let mut values = vec![
            json!("b"),
            json!(2),
            Value::Null,
            json!(1.5),
            json!("a"),
            json!(true),
        ];
        values.sort_by(compare_values);
        assert_eq!(
            values,
            vec![Value::Null, json!(true), json!(1.5), json!(2), json!("a"), json!("b")]
        );
    }

    #[test]
    fn key_transforms() {
        assert_eq!(KeyTransform::Camel.apply("created_at"), "createdAt");
        assert_eq!(KeyTransform::Camel.apply("first-name"), "firstName");
        assert_eq!(KeyTransform::Dash.apply("createdAt"), "created-at");
        assert_eq!(KeyTransform::Dash.apply("created_at"), "created-at");
        assert_eq!(KeyTransform::Underscore.apply("createdAt"), "created_at");
        assert_eq!(KeyTransform::Underscore.apply("parseHTTPResponse"), "parse_http_response");
        assert_eq!(KeyTransform::Underscore.apply("userID"), "user_id");
        assert_eq!(KeyTransform::Dash.apply("HTMLParser2Go"), "html-parser2-go");
        assert_eq!(KeyTransform::Unaltered.apply("created_at"), "created_at");
    }
}
