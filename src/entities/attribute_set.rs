use std::collections::BTreeMap;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical ordered key-value representation of a variant attribute
/// combination, e.g. `{color: red, size: L}`.
///
/// Backed by a `BTreeMap` so two combinations are equal exactly when their
/// key sets and per-key values are equal, independent of insertion order.
/// Persisted as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct AttributeSet(pub BTreeMap<String, String>);

impl AttributeSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Stable `key=value,key=value` rendering, used in duplicate-combination
    /// error messages and logs.
    pub fn canonical_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<(String, String)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Allowed values of a named variant attribute, persisted as a JSON column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct AttributeValues(pub Vec<String>);

impl AttributeValues {
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_order_independent() {
        let mut a = AttributeSet::new();
        a.insert("size", "L");
        a.insert("color", "red");

        let mut b = AttributeSet::new();
        b.insert("color", "red");
        b.insert("size", "L");

        assert_eq!(a, b);
    }

    #[test]
    fn differing_value_or_key_set_breaks_equality() {
        let mut a = AttributeSet::new();
        a.insert("color", "red");

        let mut b = AttributeSet::new();
        b.insert("color", "blue");
        assert_ne!(a, b);

        let mut c = AttributeSet::new();
        c.insert("color", "red");
        c.insert("size", "L");
        assert_ne!(a, c);
    }

    #[test]
    fn canonical_string_is_sorted_by_key() {
        let mut attrs = AttributeSet::new();
        attrs.insert("size", "L");
        attrs.insert("color", "red");
        assert_eq!(attrs.canonical_string(), "color=red,size=L");
    }

    #[test]
    fn round_trips_through_json() {
        let mut attrs = AttributeSet::new();
        attrs.insert("color", "red");
        let json = serde_json::to_string(&attrs).unwrap();
        let back: AttributeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(attrs, back);
    }
}
