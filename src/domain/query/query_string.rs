//! Client query-string model with bracket operator syntax.
//!
//! `price[gte]=500&difficulty=easy&difficulty=medium` parses into
//!
//! ```text
//! price      → Operators { gte: "500" }
//! difficulty → Many ["easy", "medium"]
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Matches `key[op]`, capturing the key and the operator.
static BRACKET_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[\]]+)\[([^\[\]]*)\]$").expect("Invalid operator key regex")
});

/// Value bound to a single query-string key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
    /// `key[op]=value` pairs, keyed by operator.
    Operators(BTreeMap<String, String>),
}

impl QueryValue {
    /// Returns the scalar value of the key.
    ///
    /// For repeated keys the last value wins. Operator maps have no scalar value.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Many(values) => values.last().map(String::as_str),
            Self::Operators(_) => None,
        }
    }

    /// Returns every plain value bound to the key, in request order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
            Self::Operators(_) => Vec::new(),
        }
    }
}

/// Parsed query string, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString(BTreeMap<String, QueryValue>);

impl QueryString {
    /// Parses decoded `key=value` pairs.
    ///
    /// Repeated plain keys collect into [`QueryValue::Many`]. `key[op]` pairs
    /// collect into [`QueryValue::Operators`], which replace any plain value
    /// for the same key. `key[]` is treated like a repeated plain key.
    pub fn parse<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, QueryValue> = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();

            match BRACKET_KEY_REGEX.captures(&key) {
                Some(caps) if !caps[2].is_empty() => {
                    let name = caps[1].to_string();
                    let operator = caps[2].to_string();
                    match map.get_mut(&name) {
                        Some(QueryValue::Operators(operators)) => {
                            operators.insert(operator, value);
                        }
                        _ => {
                            map.insert(
                                name,
                                QueryValue::Operators(BTreeMap::from([(operator, value)])),
                            );
                        }
                    }
                }
                Some(caps) => push_plain(&mut map, caps[1].to_string(), value),
                None => push_plain(&mut map, key, value),
            }
        }

        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    /// Returns the scalar value of `key`, if any.
    pub fn get_single(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(QueryValue::as_single)
    }

    /// Replaces the value of `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), QueryValue::Single(value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

fn push_plain(map: &mut BTreeMap<String, QueryValue>, key: String, value: String) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, QueryValue::Single(value));
        }
        Some(QueryValue::Single(existing)) => {
            let first = std::mem::take(existing);
            map.insert(key, QueryValue::Many(vec![first, value]));
        }
        Some(QueryValue::Many(values)) => values.push(value),
        // An operator map for the same key takes precedence.
        Some(QueryValue::Operators(_)) => {}
    }
}
