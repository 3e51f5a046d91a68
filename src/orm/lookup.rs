//! Field lookups - the comparison at the end of a filter path

use regex::{Regex, RegexBuilder};

use crate::orm::value::Scalar;
use crate::orm::{FilterValue, QueryError};
use crate::schema::FieldKind;

/// Comparison applied between a stored value and the filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookup {
    #[default]
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    IsNull,
    Regex,
    IRegex,
}

impl Lookup {
    pub const ALL: [Lookup; 16] = [
        Lookup::Exact,
        Lookup::IExact,
        Lookup::Contains,
        Lookup::IContains,
        Lookup::StartsWith,
        Lookup::IStartsWith,
        Lookup::EndsWith,
        Lookup::IEndsWith,
        Lookup::In,
        Lookup::Gt,
        Lookup::Gte,
        Lookup::Lt,
        Lookup::Lte,
        Lookup::IsNull,
        Lookup::Regex,
        Lookup::IRegex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::IStartsWith => "istartswith",
            Lookup::EndsWith => "endswith",
            Lookup::IEndsWith => "iendswith",
            Lookup::In => "in",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::IsNull => "isnull",
            Lookup::Regex => "regex",
            Lookup::IRegex => "iregex",
        }
    }

    pub fn from_name(name: &str) -> Option<Lookup> {
        Lookup::ALL.iter().copied().find(|l| l.as_str() == name)
    }

    /// Comma separated list of lookup names for help texts
    pub fn names() -> String {
        Lookup::ALL
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn is_range(&self) -> bool {
        matches!(self, Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte)
    }

    /// Check the filter value against the terminal field and build the operand
    pub fn prepare(
        &self,
        field: &str,
        kind: FieldKind,
        value: &FilterValue,
    ) -> Result<Operand, QueryError> {
        let unsupported = || QueryError::UnsupportedLookup {
            field: field.to_string(),
            kind,
            lookup: self.as_str().to_string(),
            available: Lookup::names(),
        };
        let coerce = |raw: &str| {
            Scalar::parse(kind, raw).ok_or_else(|| QueryError::InvalidValue {
                field: field.to_string(),
                kind,
                value: raw.to_string(),
            })
        };
        let single = || match value {
            FilterValue::Single(v) => v.clone(),
            FilterValue::Many(vs) => vs.join(","),
        };

        match self {
            Lookup::Exact => Ok(Operand::Value(coerce(&single())?)),
            Lookup::In => {
                let values = value
                    .as_slice()
                    .iter()
                    .map(|raw| coerce(raw))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Operand::List(values))
            }
            Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte => {
                if !kind.is_ordered() {
                    return Err(unsupported());
                }
                Ok(Operand::Value(coerce(&single())?))
            }
            Lookup::IsNull => {
                let raw = single();
                Scalar::parse(FieldKind::Boolean, &raw)
                    .map(|s| Operand::Flag(s == Scalar::Bool(true)))
                    .ok_or(QueryError::InvalidValue {
                        field: format!("{}__isnull", field),
                        kind: FieldKind::Boolean,
                        value: raw,
                    })
            }
            Lookup::IExact
            | Lookup::Contains
            | Lookup::IContains
            | Lookup::StartsWith
            | Lookup::IStartsWith
            | Lookup::EndsWith
            | Lookup::IEndsWith => {
                if kind == FieldKind::Boolean {
                    return Err(unsupported());
                }
                let text = single();
                Ok(Operand::Text(if self.case_insensitive() {
                    text.to_lowercase()
                } else {
                    text
                }))
            }
            Lookup::Regex | Lookup::IRegex => {
                let pattern = single();
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(*self == Lookup::IRegex)
                    .build()
                    .map_err(|source| QueryError::Regex {
                        pattern: pattern.clone(),
                        source,
                    })?;
                Ok(Operand::Pattern(regex))
            }
        }
    }

    fn case_insensitive(&self) -> bool {
        matches!(
            self,
            Lookup::IExact | Lookup::IContains | Lookup::IStartsWith | Lookup::IEndsWith
        )
    }

    /// Apply the lookup to one stored value
    pub fn matches(&self, stored: &Scalar, operand: &Operand) -> bool {
        if *self == Lookup::IsNull {
            return matches!(operand, Operand::Flag(want) if stored.is_null() == *want);
        }
        if stored.is_null() {
            return false;
        }

        match operand {
            Operand::Value(v) if self.is_range() => {
                let Some(ord) = stored.compare(v) else {
                    return false;
                };
                match self {
                    Lookup::Gt => ord.is_gt(),
                    Lookup::Gte => ord.is_ge(),
                    Lookup::Lt => ord.is_lt(),
                    _ => ord.is_le(),
                }
            }
            Operand::Value(v) => stored.matches(v),
            Operand::List(values) => values.iter().any(|v| stored.matches(v)),
            Operand::Text(needle) => {
                let haystack = if self.case_insensitive() {
                    stored.text().to_lowercase()
                } else {
                    stored.text()
                };
                match self {
                    Lookup::IExact => haystack == *needle,
                    Lookup::Contains | Lookup::IContains => haystack.contains(needle.as_str()),
                    Lookup::StartsWith | Lookup::IStartsWith => {
                        haystack.starts_with(needle.as_str())
                    }
                    _ => haystack.ends_with(needle.as_str()),
                }
            }
            Operand::Pattern(regex) => regex.is_match(&stored.text()),
            Operand::Flag(_) => false,
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A filter value checked and converted for its lookup
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Scalar),
    List(Vec<Scalar>),
    Text(String),
    Pattern(Regex),
    Flag(bool),
}
