//! Parser for the textual filter syntax.
//!
//! Accepts the flat subset of the SCIM filter grammar the predicate compiler
//! understands:
//!
//! ```text
//! filter      = conjunction *("or" conjunction)
//! conjunction = comparison *("and" comparison)
//! comparison  = attrPath SP compareOp SP compValue / attrPath SP "pr"
//! ```
//!
//! `and` binds tighter than `or`, so the result is directly a list of
//! alternate conjunctions. Grouping, `not` and value paths are rejected.

use super::{ComparisonOperator, Conjunction, FilterTerm};
use crate::error::{ScimError, ScimResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
}

fn tokenize(input: &str) -> ScimResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => value.push(other),
                }
            }
            if !closed {
                return Err(ScimError::invalid_filter("unterminated string literal"));
            }
            tokens.push(Token::Quoted(value));
        } else if matches!(c, '(' | ')' | '[' | ']') {
            return Err(ScimError::invalid_filter(format!(
                "grouping with '{}' is not supported",
                c
            )));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || matches!(c, '"' | '(' | ')' | '[' | ']') {
                    break;
                }
                word.push(c);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }

    Ok(tokens)
}

/// Parse a filter string into alternate conjunctions.
///
/// A blank string yields no conjunctions, which matches everything.
pub fn parse_filter(input: &str) -> ScimResult<Vec<Conjunction>> {
    let tokens = tokenize(input)?;
    let mut tokens = tokens.into_iter();

    let mut alternatives = Vec::new();
    let mut current: Vec<FilterTerm> = Vec::new();

    loop {
        let attribute_path = match tokens.next() {
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("not") => {
                return Err(ScimError::invalid_filter("'not' is not supported"));
            }
            Some(Token::Word(word)) => word,
            Some(Token::Quoted(value)) => {
                return Err(ScimError::invalid_filter(format!(
                    "expected attribute path, found \"{}\"",
                    value
                )));
            }
            None if current.is_empty() && alternatives.is_empty() => return Ok(alternatives),
            None => return Err(ScimError::invalid_filter("filter ends after a logical operator")),
        };

        let operator = match tokens.next() {
            Some(Token::Word(word)) => word
                .parse::<ComparisonOperator>()
                .map_err(ScimError::invalid_filter)?,
            _ => {
                return Err(ScimError::invalid_filter(format!(
                    "expected operator after '{}'",
                    attribute_path
                )));
            }
        };

        let comparison_value = if operator == ComparisonOperator::Present {
            String::new()
        } else {
            match tokens.next() {
                Some(Token::Word(value)) | Some(Token::Quoted(value)) => value,
                None => {
                    return Err(ScimError::invalid_filter(format!(
                        "expected value after '{} {}'",
                        attribute_path, operator
                    )));
                }
            }
        };

        current.push(FilterTerm::new(attribute_path, operator, comparison_value));

        match tokens.next() {
            None => {
                alternatives.push(Conjunction::from(current));
                return Ok(alternatives);
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("and") => {}
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("or") => {
                alternatives.push(Conjunction::from(std::mem::take(&mut current)));
            }
            Some(Token::Word(word)) | Some(Token::Quoted(word)) => {
                return Err(ScimError::invalid_filter(format!(
                    "expected 'and' or 'or', found '{}'",
                    word
                )));
            }
        }
    }
}
