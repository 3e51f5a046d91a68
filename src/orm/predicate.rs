//! Filter predicates

use serde::Serialize;

/// Right-hand side of a predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    /// Values of an `__in` filter
    Many(Vec<String>),
}

impl FilterValue {
    pub fn as_slice(&self) -> &[String] {
        match self {
            FilterValue::Single(v) => std::slice::from_ref(v),
            FilterValue::Many(vs) => vs.as_slice(),
        }
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterValue::Single(v) => write!(f, "{}", v),
            FilterValue::Many(vs) => write!(f, "{}", vs.join(",")),
        }
    }
}

/// One field comparison, optionally negated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    /// Field path with optional trailing lookup, e.g. `server__name__startswith`
    pub path: String,
    pub negated: bool,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(path: impl Into<String>, value: FilterValue) -> Self {
        Self {
            path: path.into(),
            negated: false,
            value,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}={}", self.path, self.value)
    }
}
