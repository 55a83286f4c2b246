//! Query-string parameters
//!
//! Keys use `.` namespacing on the wire. Call sites may spell the dot as a
//! double underscore (`schema__type` becomes `schema.type`), and booleans are
//! always sent as `0`/`1`.

/// A scalar query-parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Wire representation of the value
    pub fn to_query_value(&self) -> String {
        match self {
            ParamValue::Bool(true) => "1".to_string(),
            ParamValue::Bool(false) => "0".to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::UInt(v) => v.to_string(),
            ParamValue::Float(v) => v.to_string(),
            ParamValue::Str(v) => v.clone(),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::UInt(v.into())
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::UInt(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::UInt(v as u64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Map call-site key spelling to the wire spelling
pub fn normalize_key(key: &str) -> String {
    key.replace("__", ".")
}

/// Ordered set of query parameters; inserting an existing key replaces its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        let key = normalize_key(key);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only when a value is present; unset values never reach the wire
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Builder-style `insert`
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        let key = normalize_key(key);
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge `other` on top of `self`
    pub fn extend(&mut self, other: &QueryParams) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    /// Key/value pairs ready for URL encoding
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_query_value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_encode_as_digits() {
        let params = QueryParams::new().with("pretty", true).with("volatile", false);
        assert_eq!(
            params.to_pairs(),
            vec![
                ("pretty".to_string(), "1".to_string()),
                ("volatile".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_double_underscore_becomes_dot() {
        let params = QueryParams::new().with("schema__type", "object");
        assert!(params.contains("schema.type"));
        assert!(params.contains("schema__type"));
        assert_eq!(params.to_pairs()[0].0, "schema.type");
    }

    #[test]
    fn test_other_scalars_pass_through() {
        let params = QueryParams::new()
            .with("offset", 20u64)
            .with("limit", 10)
            .with("boost", 1.5)
            .with("query", "title:dune");
        let pairs = params.to_pairs();
        assert_eq!(pairs[0].1, "20");
        assert_eq!(pairs[1].1, "10");
        assert_eq!(pairs[2].1, "1.5");
        assert_eq!(pairs[3].1, "title:dune");
    }

    #[test]
    fn test_insert_replaces_and_keeps_order() {
        let mut params = QueryParams::new().with("a", 1).with("b", 2);
        params.insert("a", 3);
        assert_eq!(
            params.to_pairs(),
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_insert_opt_skips_unset() {
        let mut params = QueryParams::new();
        params.insert_opt::<u64>("offset", None);
        params.insert_opt("limit", Some(5u64));
        assert!(!params.contains("offset"));
        assert_eq!(params.len(), 1);
    }
}
