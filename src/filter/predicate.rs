//! Compilation of filter expressions into executable predicates.
//!
//! Compilation resolves every term against the resource type's dispatch
//! table up front, so a bad filter fails before any resource is examined and
//! matching itself cannot fail.

use super::attributes::{AttributeKind, Filterable};
use super::{ComparisonOperator, Conjunction, FilterTerm};
use crate::error::{ScimError, ScimResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::trace;

enum Matcher<T> {
    TextEquals {
        get: fn(&T) -> Option<&str>,
        expected: String,
    },
    BooleanEquals {
        get: fn(&T) -> bool,
        expected: bool,
    },
    TimestampAtLeast {
        get: fn(&T) -> Option<DateTime<Utc>>,
        bound: DateTime<Utc>,
    },
    TimestampAtMost {
        get: fn(&T) -> Option<DateTime<Utc>>,
        bound: DateTime<Utc>,
    },
}

impl<T> Matcher<T> {
    fn matches(&self, resource: &T) -> bool {
        match self {
            Matcher::TextEquals { get, expected } => get(resource).is_some_and(|actual| {
                actual
                    .chars()
                    .flat_map(char::to_lowercase)
                    .eq(expected.chars())
            }),
            Matcher::BooleanEquals { get, expected } => get(resource) == *expected,
            Matcher::TimestampAtLeast { get, bound } => get(resource).is_some_and(|t| t >= *bound),
            Matcher::TimestampAtMost { get, bound } => get(resource).is_some_and(|t| t <= *bound),
        }
    }
}

/// A compiled filter for resources of type `T`.
///
/// Holds alternate conjunctions of matchers. No alternatives means the
/// filter was empty and every resource matches.
pub struct Predicate<T> {
    alternatives: Vec<Vec<Matcher<T>>>,
}

impl<T> Predicate<T> {
    /// A predicate that accepts every resource.
    pub fn always() -> Self {
        Self {
            alternatives: Vec::new(),
        }
    }

    /// Whether this predicate accepts every resource.
    pub fn is_match_all(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Evaluate the predicate against one resource.
    pub fn matches(&self, resource: &T) -> bool {
        self.is_match_all()
            || self
                .alternatives
                .iter()
                .any(|conjunction| conjunction.iter().all(|m| m.matches(resource)))
    }
}

impl<T> std::fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predicate")
            .field(
                "alternatives",
                &self.alternatives.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Compile alternate conjunctions into a predicate over `T`.
///
/// Fails on the first term that is blank, names an attribute `T` does not
/// expose, uses an operator the attribute does not support, or carries a
/// value that cannot be parsed for the attribute.
pub fn compile<T: Filterable>(conjunctions: &[Conjunction]) -> ScimResult<Predicate<T>> {
    let mut alternatives = Vec::with_capacity(conjunctions.len());

    for conjunction in conjunctions {
        if conjunction.is_empty() {
            return Err(ScimError::invalid_filter(
                "filter contains a conjunction without terms",
            ));
        }

        let matchers = conjunction
            .terms()
            .iter()
            .map(compile_term::<T>)
            .collect::<ScimResult<Vec<_>>>()?;
        alternatives.push(matchers);
    }

    trace!(
        "Compiled filter with {} alternative(s): {}",
        alternatives.len(),
        conjunctions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ")
    );

    Ok(Predicate { alternatives })
}

fn compile_term<T: Filterable>(term: &FilterTerm) -> ScimResult<Matcher<T>> {
    // Paths resolve exactly as written; padding is not stripped.
    let path = term.attribute_path.as_str();
    if path.trim().is_empty() {
        return Err(ScimError::invalid_filter("filter term has a blank attribute path"));
    }
    if term.comparison_value.trim().is_empty() {
        return Err(ScimError::invalid_filter(format!(
            "filter term on '{}' has a blank comparison value",
            path
        )));
    }

    let kind = T::filter_attribute(path)
        .ok_or_else(|| ScimError::unsupported_filter_attribute(path))?;

    match (kind, term.operator) {
        (AttributeKind::Text(get), ComparisonOperator::Equals) => Ok(Matcher::TextEquals {
            get,
            expected: term
                .comparison_value
                .chars()
                .flat_map(char::to_lowercase)
                .collect(),
        }),
        (AttributeKind::Boolean(get), ComparisonOperator::Equals) => Ok(Matcher::BooleanEquals {
            get,
            expected: parse_boolean(path, &term.comparison_value)?,
        }),
        (AttributeKind::Timestamp(get), ComparisonOperator::EqualOrGreaterThan) => {
            Ok(Matcher::TimestampAtLeast {
                get,
                bound: parse_timestamp(path, &term.comparison_value)?,
            })
        }
        (AttributeKind::Timestamp(get), ComparisonOperator::EqualOrLessThan) => {
            Ok(Matcher::TimestampAtMost {
                get,
                bound: parse_timestamp(path, &term.comparison_value)?,
            })
        }
        (_, operator) => Err(ScimError::unsupported_filter_operator(operator, path)),
    }
}

fn parse_boolean(path: &str, value: &str) -> ScimResult<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(ScimError::invalid_filter(format!(
            "'{}' is not a boolean value for '{}'",
            value, path
        )))
    }
}

/// Parse a timestamp comparison value, normalizing to UTC.
///
/// Values without an offset are taken to be UTC already.
fn parse_timestamp(path: &str, value: &str) -> ScimResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(ScimError::invalid_filter(format!(
        "'{}' is not a timestamp value for '{}'",
        value, path
    )))
}
