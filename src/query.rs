//! Query execution over a resource listing.
//!
//! The executor is pure: the provider fetches the listing from the
//! repository and hands it over together with the caller's parameters.

use crate::error::{ScimResult, ValidationError};
use crate::filter::{Conjunction, Filterable, compile, parse_filter};
use log::debug;
use serde::{Deserialize, Serialize};

/// Pagination requested by the caller.
///
/// Only a result limit is supported. An absent count limits to zero results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl PaginationParameters {
    pub fn with_count(count: usize) -> Self {
        Self { count: Some(count) }
    }
}

/// Parameters of a query request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameters {
    /// Alternate conjunctions; empty matches everything
    #[serde(default)]
    pub alternate_filters: Vec<Conjunction>,
    /// Schema of the resources being queried
    pub schema_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationParameters>,
}

impl QueryParameters {
    /// Query every resource of the given schema.
    pub fn new(schema_identifier: impl Into<String>) -> Self {
        Self {
            alternate_filters: Vec::new(),
            schema_identifier: schema_identifier.into(),
            pagination: None,
        }
    }

    /// Query with filters parsed from their textual form.
    pub fn from_filter_str(schema_identifier: impl Into<String>, filter: &str) -> ScimResult<Self> {
        Ok(Self::new(schema_identifier).with_filters(parse_filter(filter)?))
    }

    /// Add one alternate conjunction.
    pub fn with_filter(mut self, conjunction: Conjunction) -> Self {
        self.alternate_filters.push(conjunction);
        self
    }

    pub fn with_filters(mut self, conjunctions: impl IntoIterator<Item = Conjunction>) -> Self {
        self.alternate_filters.extend(conjunctions);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.pagination = Some(PaginationParameters::with_count(count));
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationParameters) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Reject parameters that name no schema.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_identifier.trim().is_empty() {
            return Err(ValidationError::MissingSchemaIdentifier);
        }
        Ok(())
    }
}

/// Filter `all` with the compiled filters, keeping order, then apply the
/// count limit when pagination was requested.
pub fn execute<T: Filterable>(all: Vec<T>, parameters: &QueryParameters) -> ScimResult<Vec<T>> {
    parameters.validate()?;
    let predicate = compile::<T>(&parameters.alternate_filters)?;

    let total = all.len();
    let matched = all.into_iter().filter(|resource| predicate.matches(resource));

    let results: Vec<T> = match parameters.pagination {
        Some(pagination) => matched.take(pagination.count.unwrap_or(0)).collect(),
        None => matched.collect(),
    };

    debug!(
        "Query on '{}' matched {} of {} resource(s)",
        parameters.schema_identifier,
        results.len(),
        total
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScimError;
    use crate::filter::FilterTerm;
    use crate::resource::{USER_SCHEMA, User};

    fn users() -> Vec<User> {
        vec![
            User::new("alice"),
            User::new("bob").with_active(false),
            User::new("carol"),
            User::new("dave").with_active(false),
        ]
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().filter_map(|u| u.user_name.as_deref()).collect()
    }

    #[test]
    fn test_no_filters_returns_everything_in_order() {
        let results = execute(users(), &QueryParameters::new(USER_SCHEMA)).unwrap();
        assert_eq!(names(&results), vec!["alice", "bob", "carol", "dave"]);
    }

    #[test]
    fn test_filter_keeps_order() {
        let parameters = QueryParameters::new(USER_SCHEMA)
            .with_filter(Conjunction::new(FilterTerm::equals("active", "false")));
        let results = execute(users(), &parameters).unwrap();
        assert_eq!(names(&results), vec!["bob", "dave"]);
    }

    #[test]
    fn test_count_limits_results() {
        let parameters = QueryParameters::new(USER_SCHEMA).with_count(3);
        assert_eq!(execute(users(), &parameters).unwrap().len(), 3);

        let parameters = QueryParameters::new(USER_SCHEMA).with_count(0);
        assert!(execute(users(), &parameters).unwrap().is_empty());

        let parameters =
            QueryParameters::new(USER_SCHEMA).with_pagination(PaginationParameters::default());
        assert!(execute(users(), &parameters).unwrap().is_empty());

        let parameters = QueryParameters::new(USER_SCHEMA).with_count(10);
        assert_eq!(execute(users(), &parameters).unwrap().len(), 4);
    }

    #[test]
    fn test_blank_schema_identifier() {
        let result = execute(users(), &QueryParameters::new("  "));
        assert!(matches!(
            result,
            Err(ScimError::Validation(ValidationError::MissingSchemaIdentifier))
        ));
    }

    #[test]
    fn test_filter_errors_propagate() {
        let parameters = QueryParameters::new(USER_SCHEMA)
            .with_filter(Conjunction::new(FilterTerm::equals("nickName", "x")));
        assert!(matches!(
            execute(users(), &parameters),
            Err(ScimError::UnsupportedFilterAttribute { .. })
        ));
    }

    #[test]
    fn test_from_filter_str() {
        let parameters =
            QueryParameters::from_filter_str(USER_SCHEMA, r#"userName eq "CAROL" or userName eq "alice""#)
                .unwrap();
        let results = execute(users(), &parameters).unwrap();
        assert_eq!(names(&results), vec!["alice", "carol"]);
    }
}
