//! Builder for MAAS request parameters.
//!
//! MAAS accepts repeated keys (`id=a&id=b`) and treats an absent parameter
//! differently from an empty one, so parameters are kept as an ordered list of
//! pairs and most setters skip zero values.

use std::fmt::Display;

/// Ordered, multi-valued request parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append `name=value` unconditionally.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.pairs.push((name.to_string(), value.into()));
    }

    /// Append `name=value` when `value` is non-empty.
    pub fn maybe_add(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.add(name, value);
        }
    }

    /// Append a numeric parameter when it is non-zero.
    pub fn maybe_add_int<T>(&mut self, name: &str, value: T)
    where
        T: Default + PartialEq + Display,
    {
        if value != T::default() {
            self.add(name, value.to_string());
        }
    }

    /// Append `name=true` when `value` is set.
    pub fn maybe_add_bool(&mut self, name: &str, value: bool) {
        if value {
            self.add(name, "true");
        }
    }

    /// Append one pair per non-empty element, keeping order.
    pub fn maybe_add_many<S: AsRef<str>>(&mut self, name: &str, values: &[S]) {
        for value in values {
            self.maybe_add(name, value.as_ref());
        }
    }

    /// The collected pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// First value recorded for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value recorded for `name`, in insertion order.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}
