//! Query string dictionary for request parameters.
//!
//! [`QueryDict`] holds decoded `key=value` pairs from a query string or a
//! form-encoded body. Keys may repeat; [`QueryDict::get`] returns the last
//! value, [`QueryDict::get_list`] returns all of them in order.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// An immutable multi-value dictionary of decoded query parameters.
///
/// # Examples
///
/// ```
/// use profiles_http::QueryDict;
///
/// let qd = QueryDict::parse("search=ada&search=grace+hopper&page=2");
/// assert_eq!(qd.get("search"), Some("grace hopper"));
/// assert_eq!(qd.get_list("search").len(), 2);
/// assert_eq!(qd.get("page"), Some("2"));
/// assert!(qd.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: HashMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates an empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL query string (without the leading `?`).
    ///
    /// Percent-escapes are decoded and `+` is treated as a space, as in
    /// `application/x-www-form-urlencoded`.
    pub fn parse(query_string: &str) -> Self {
        let mut data: HashMap<String, Vec<String>> = HashMap::new();

        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.entry(decode(key)).or_default().push(decode(value));
        }

        Self { data }
    }

    /// Returns the last value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns every value for the given key (empty if absent).
    pub fn get_list(&self, key: &str) -> &[String] {
        self.data.get(key).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Converts the dictionary into a JSON object, using the last value per key.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .data
            .iter()
            .filter_map(|(k, values)| {
                values
                    .last()
                    .map(|v| (k.clone(), serde_json::Value::String(v.clone())))
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
