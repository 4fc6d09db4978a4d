//! Filter expressions over provisioned resources.
//!
//! A filter is a list of alternate [`Conjunction`]s: a resource matches when
//! it satisfies every term of at least one conjunction. An empty list matches
//! everything.
//!
//! ```rust
//! use scim_provisioning::filter::{Conjunction, FilterTerm, parse_filter};
//!
//! let parsed = parse_filter(r#"userName eq "alice" and active eq true or externalId eq "ext1""#)
//!     .unwrap();
//!
//! let built = vec![
//!     Conjunction::new(FilterTerm::equals("userName", "alice"))
//!         .and(FilterTerm::equals("active", "true")),
//!     Conjunction::new(FilterTerm::equals("externalId", "ext1")),
//! ];
//! assert_eq!(parsed, built);
//! ```

pub mod attributes;
pub mod parser;
pub mod predicate;

pub use attributes::{AttributeKind, FilterAttribute, Filterable};
pub use parser::parse_filter;
pub use predicate::{Predicate, compile};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operators of the filter grammar.
///
/// Only `eq`, `ge` and `le` compile against the supported attributes; the
/// rest parse so they can be rejected with a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "eq")]
    Equals,
    #[serde(rename = "ne")]
    NotEquals,
    #[serde(rename = "co")]
    Contains,
    #[serde(rename = "sw")]
    StartsWith,
    #[serde(rename = "ew")]
    EndsWith,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "ge")]
    EqualOrGreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "le")]
    EqualOrLessThan,
    #[serde(rename = "pr")]
    Present,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "eq",
            ComparisonOperator::NotEquals => "ne",
            ComparisonOperator::Contains => "co",
            ComparisonOperator::StartsWith => "sw",
            ComparisonOperator::EndsWith => "ew",
            ComparisonOperator::GreaterThan => "gt",
            ComparisonOperator::EqualOrGreaterThan => "ge",
            ComparisonOperator::LessThan => "lt",
            ComparisonOperator::EqualOrLessThan => "le",
            ComparisonOperator::Present => "pr",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" => Ok(ComparisonOperator::Equals),
            "ne" => Ok(ComparisonOperator::NotEquals),
            "co" => Ok(ComparisonOperator::Contains),
            "sw" => Ok(ComparisonOperator::StartsWith),
            "ew" => Ok(ComparisonOperator::EndsWith),
            "gt" => Ok(ComparisonOperator::GreaterThan),
            "ge" => Ok(ComparisonOperator::EqualOrGreaterThan),
            "lt" => Ok(ComparisonOperator::LessThan),
            "le" => Ok(ComparisonOperator::EqualOrLessThan),
            "pr" => Ok(ComparisonOperator::Present),
            other => Err(format!("unknown comparison operator '{}'", other)),
        }
    }
}

/// A single `attributePath operator value` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterTerm {
    pub attribute_path: String,
    pub operator: ComparisonOperator,
    pub comparison_value: String,
}

impl FilterTerm {
    pub fn new(
        attribute_path: impl Into<String>,
        operator: ComparisonOperator,
        comparison_value: impl Into<String>,
    ) -> Self {
        Self {
            attribute_path: attribute_path.into(),
            operator,
            comparison_value: comparison_value.into(),
        }
    }

    /// `attribute_path eq comparison_value`
    pub fn equals(attribute_path: impl Into<String>, comparison_value: impl Into<String>) -> Self {
        Self::new(attribute_path, ComparisonOperator::Equals, comparison_value)
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\"",
            self.attribute_path, self.operator, self.comparison_value
        )
    }
}

/// An ordered AND chain of filter terms.
///
/// Term order is kept for display and error reporting only; matching is a
/// pure conjunction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conjunction {
    terms: Vec<FilterTerm>,
}

impl Conjunction {
    /// Start a chain with its first term.
    pub fn new(term: FilterTerm) -> Self {
        Self { terms: vec![term] }
    }

    /// Append another term to the chain.
    pub fn and(mut self, term: FilterTerm) -> Self {
        self.terms.push(term);
        self
    }

    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl From<Vec<FilterTerm>> for Conjunction {
    fn from(terms: Vec<FilterTerm>) -> Self {
        Self { terms }
    }
}

impl FromIterator<FilterTerm> for Conjunction {
    fn from_iter<I: IntoIterator<Item = FilterTerm>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}
