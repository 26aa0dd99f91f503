//! Selector queries over JSON documents
//!
//! A selector is a conjunction of predicates, each addressing a field by a
//! dotted path (`"project.id"`, `"key.name"`). Only equality and `$in`
//! membership are supported.

use serde_json::Value;

use crate::error::StoreError;

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value
    Eq(Value),
    /// Field equals one of the values (`$in`)
    In(Vec<Value>),
}

impl Predicate {
    fn matches(&self, field: Option<&Value>) -> bool {
        match (self, field) {
            (Predicate::Eq(expected), Some(actual)) => expected == actual,
            (Predicate::In(candidates), Some(actual)) => candidates.contains(actual),
            (_, None) => false,
        }
    }
}

/// Conjunction of field predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    predicates: Vec<(String, Predicate)>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `path` to equal `value`.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((path.into(), Predicate::Eq(value.into())));
        self
    }

    /// Require `path` to equal `value` when present; an absent value
    /// matches anything.
    pub fn eq_opt<V: Into<Value>>(self, path: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(path, value),
            None => self,
        }
    }

    /// Require `path` to equal one of `values`. An empty set matches nothing.
    pub fn any_of<I, V>(mut self, path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.predicates.push((path.into(), Predicate::In(values)));
        self
    }

    pub fn predicates(&self) -> &[(String, Predicate)] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Reject paths with empty segments.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (path, _) in &self.predicates {
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(StoreError::InvalidSelector(format!(
                    "malformed field path {:?}",
                    path
                )));
            }
        }
        Ok(())
    }

    /// Whether `doc` satisfies every predicate.
    pub fn matches(&self, doc: &Value) -> bool {
        self.predicates
            .iter()
            .all(|(path, predicate)| predicate.matches(lookup(doc, path)))
    }
}

/// Resolve a dotted path inside a document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}
