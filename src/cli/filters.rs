//! Filter tokens from the command line
//!
//! `key=value` filters on equality, `key__in=a,b` on any of a list, and a
//! leading `!` or `~` negates: `'!status=retired'`.

use tracing::debug;

use crate::orm::{FilterValue, Predicate, QueryError};

const NEGATIONS: [char; 2] = ['!', '~'];
const IN_SUFFIX: &str = "__in";

/// Parse one `key=value` token
pub fn parse_filter(token: &str) -> Result<Predicate, QueryError> {
    let malformed = || QueryError::MalformedFilter {
        token: token.to_string(),
    };

    let (key, value) = token.split_once('=').ok_or_else(malformed)?;
    let key = key.trim();
    let (negated, key) = match key.strip_prefix(NEGATIONS) {
        Some(rest) => (true, rest.trim_start()),
        None => (false, key),
    };
    if key.is_empty() {
        return Err(malformed());
    }

    let value = if key.ends_with(IN_SUFFIX) {
        FilterValue::Many(value.split(',').map(|v| v.to_string()).collect())
    } else {
        FilterValue::Single(value.to_string())
    };

    let predicate = Predicate::new(key, value);
    Ok(if negated { predicate.negate() } else { predicate })
}

/// Parse every filter token, failing on the first malformed one
pub fn parse_filters<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Predicate>, QueryError> {
    let predicates = tokens
        .iter()
        .map(|t| parse_filter(t.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = predicates.len(), "parsed filters");
    Ok(predicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_filter() {
        let p = parse_filter("name=mc01").unwrap();
        assert_eq!(p.path, "name");
        assert!(!p.negated);
        assert_eq!(p.value, FilterValue::Single("mc01".to_string()));
    }

    #[test]
    fn test_splits_on_first_equals() {
        let p = parse_filter("note__contains=a=b").unwrap();
        assert_eq!(p.path, "note__contains");
        assert_eq!(p.value, FilterValue::Single("a=b".to_string()));
    }

    #[test]
    fn test_in_filter_splits_values() {
        let p = parse_filter("name__in=eth0,eth1").unwrap();
        assert_eq!(
            p.value,
            FilterValue::Many(vec!["eth0".to_string(), "eth1".to_string()])
        );
    }

    #[test]
    fn test_negation_prefixes() {
        for token in ["!ip__contains=.82.", "~ip__contains=.82."] {
            let p = parse_filter(token).unwrap();
            assert!(p.negated, "{token}");
            assert_eq!(p.path, "ip__contains");
        }
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let p = parse_filter("notes=").unwrap();
        assert_eq!(p.value, FilterValue::Single(String::new()));
    }

    #[test]
    fn test_rejects_missing_equals() {
        let err = parse_filter("name").unwrap_err();
        assert!(matches!(err, QueryError::MalformedFilter { ref token } if token == "name"));
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(parse_filter("=mc01").is_err());
        assert!(parse_filter("!=mc01").is_err());
    }

    #[test]
    fn test_parse_filters_stops_at_first_error() {
        assert_eq!(parse_filters(&["a=1", "b=2"]).unwrap().len(), 2);
        assert!(parse_filters(&["a=1", "oops"]).is_err());
    }
}
