//! Query Engine (C7, §4.7): parses and evaluates the query language against [`MapEntry`]s.

use regex::Regex;

use crate::mapentry::MapEntry;
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Joiner {
    And,
    Or,
}

#[derive(Clone, Debug)]
enum Comparator {
    Eq,
    Ne,
    Regex(Regex),
}

#[derive(Clone, Debug)]
struct Condition {
    field: String,
    comparator: Comparator,
    values: Vec<String>,
}

/// Query is a parsed §4.7 expression: a list of [`Condition`]s joined left-to-right by AND/OR,
/// evaluated without operator precedence (informal grammar has none).
#[derive(Clone, Debug)]
pub struct Query {
    conditions: Vec<Condition>,
    joiners: Vec<Joiner>,
}

impl Query {
    /// Parse compiles a query string. An empty or whitespace-only string parses to the query
    /// that matches every entry (Testable Property 4: "empty query matches all entries").
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self { conditions: Vec::new(), joiners: Vec::new() });
        }

        let tokens = tokenize(input)?;
        let mut conditions = Vec::new();
        let mut joiners = Vec::new();

        let mut iter = tokens.into_iter().peekable();
        conditions.push(parse_condition(&mut iter)?);
        loop {
            match iter.peek() {
                None => break,
                Some(Token::And) => {
                    iter.next();
                    joiners.push(Joiner::And);
                }
                Some(Token::Or) => {
                    iter.next();
                    joiners.push(Joiner::Or);
                }
                // §4.7: "missing operator between conditions defaults to AND".
                Some(Token::Condition(_, _, _)) => joiners.push(Joiner::And),
            }
            conditions.push(parse_condition(&mut iter)?);
        }

        Ok(Self { conditions, joiners })
    }

    /// Matches evaluates this query against `entry`. Evaluation is total: a missing field never
    /// panics or errors (§4.7 "Error model").
    pub fn matches(&self, entry: &MapEntry) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        let mut result = evaluate(&self.conditions[0], entry);
        for (joiner, condition) in self.joiners.iter().zip(self.conditions.iter().skip(1)) {
            let next = evaluate(condition, entry);
            result = match joiner {
                Joiner::And => result && next,
                Joiner::Or => result || next,
            };
        }
        result
    }
}

fn evaluate(condition: &Condition, entry: &MapEntry) -> bool {
    let field_value = entry.get_field(&condition.field);
    match &condition.comparator {
        Comparator::Ne => match field_value {
            // §4.7: "a non-existent field is not equal to any concrete value".
            None => true,
            Some(v) => !condition.values.iter().any(|want| eq_case_insensitive(&v, want)),
        },
        Comparator::Eq => match field_value {
            None => false,
            Some(v) => condition.values.iter().any(|want| glob_or_eq(&v, want)),
        },
        Comparator::Regex(re) => match field_value {
            None => false,
            Some(v) => re.is_match(&v),
        },
    }
}

fn eq_case_insensitive(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn glob_or_eq(value: &str, pattern: &str) -> bool {
    if pattern.contains('*') {
        let escaped = regex::escape(pattern).replace("\\*", ".*");
        match Regex::new(&format!("(?i)^{escaped}$")) {
            Ok(re) => re.is_match(value),
            Err(_) => false,
        }
    } else {
        eq_case_insensitive(value, pattern)
    }
}

#[derive(Debug)]
enum Token {
    And,
    Or,
    Condition(String, RawComparator, String),
}

#[derive(Debug)]
enum RawComparator {
    Eq,
    Ne,
    Regex,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    for word in split_preserving_brackets(input) {
        match word.to_ascii_uppercase().as_str() {
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            _ => tokens.push(parse_raw_condition(&word)?),
        }
    }
    Ok(tokens)
}

/// Split_preserving_brackets splits on whitespace but keeps `labels[key with spaces]` intact and
/// does not split inside a condition's value list.
fn split_preserving_brackets(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in input.chars() {
        match ch {
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth -= 1;
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn parse_raw_condition(word: &str) -> Result<Token> {
    let (field, comparator, value) = if let Some(idx) = word.find("!=") {
        (&word[..idx], RawComparator::Ne, &word[idx + 2..])
    } else if let Some(idx) = word.find("~=") {
        (&word[..idx], RawComparator::Regex, &word[idx + 2..])
    } else if let Some(idx) = word.find('=') {
        (&word[..idx], RawComparator::Eq, &word[idx + 1..])
    } else {
        return Err(Error::ParseError(format!("expected a condition, got {word:?}")));
    };
    if field.is_empty() {
        return Err(Error::ParseError(format!("empty field in condition {word:?}")));
    }
    Ok(Token::Condition(field.to_string(), comparator, value.to_string()))
}

fn parse_condition(iter: &mut std::iter::Peekable<std::vec::IntoIter<Token>>) -> Result<Condition> {
    match iter.next() {
        Some(Token::Condition(field, RawComparator::Eq, value)) => Ok(Condition {
            field,
            comparator: Comparator::Eq,
            values: value.split(',').map(str::to_string).collect(),
        }),
        Some(Token::Condition(field, RawComparator::Ne, value)) => Ok(Condition {
            field,
            comparator: Comparator::Ne,
            values: value.split(',').map(str::to_string).collect(),
        }),
        Some(Token::Condition(field, RawComparator::Regex, value)) => {
            let re = Regex::new(&value)?;
            Ok(Condition { field, comparator: Comparator::Regex(re), values: vec![value] })
        }
        other => Err(Error::ParseError(format!("expected a condition, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::{Ownership, OwnerType};
    use std::collections::BTreeMap;

    fn entry(name: &str, owner: OwnerType, namespace: &str, labels: &[(&str, &str)]) -> MapEntry {
        MapEntry {
            id: format!("cluster/{namespace}/apps/Deployment/{name}"),
            cluster: "cluster".to_string(),
            namespace: namespace.to_string(),
            kind: "Deployment".to_string(),
            name: name.to_string(),
            api_version: "apps/v1".to_string(),
            owner: Some(Ownership { owner_type: owner, sub_type: None, name: String::new(), namespace: String::new() }),
            deployer: None,
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>(),
            drift: None,
            variant: None,
            status: crate::mapentry::Status::Ready,
            confighub: None,
            ccves: Vec::new(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = Query::parse("").unwrap();
        assert!(q.matches(&entry("frontend", OwnerType::Flux, "prod", &[])));
    }

    #[test]
    fn and_query_narrows_results() {
        let entries = vec![
            entry("frontend", OwnerType::Flux, "prod", &[]),
            entry("backend", OwnerType::Flux, "dev", &[]),
            entry("debug", OwnerType::Unknown, "default", &[]),
        ];
        let q = Query::parse("owner=Flux AND namespace!=default").unwrap();
        let matched: Vec<_> = entries.iter().filter(|e| q.matches(e)).map(|e| e.name.clone()).collect();
        assert_eq!(matched, vec!["frontend", "backend"]);
    }

    #[test]
    fn or_query_with_label_bracket_field() {
        let entries = vec![
            entry("frontend", OwnerType::Flux, "prod", &[("app", "frontend")]),
            entry("backend", OwnerType::Flux, "dev", &[]),
            entry("debug", OwnerType::Unknown, "default", &[]),
        ];
        let q = Query::parse("labels[app]=frontend OR owner=Native").unwrap();
        let matched: Vec<_> = entries.iter().filter(|e| q.matches(e)).map(|e| e.name.clone()).collect();
        assert_eq!(matched, vec!["frontend", "debug"]);
    }

    #[test]
    fn glob_matches_any_suffix() {
        let q = Query::parse("name=front*").unwrap();
        assert!(q.matches(&entry("frontend", OwnerType::Flux, "prod", &[])));
        assert!(!q.matches(&entry("backend", OwnerType::Flux, "prod", &[])));
    }

    #[test]
    fn missing_field_is_never_equal_but_always_not_equal() {
        let e = entry("frontend", OwnerType::Flux, "prod", &[]);
        assert!(!Query::parse("labels[missing]=x").unwrap().matches(&e));
        assert!(Query::parse("labels[missing]!=x").unwrap().matches(&e));
    }

    #[test]
    fn and_result_is_subset_of_either_operand() {
        let entries = vec![
            entry("frontend", OwnerType::Flux, "prod", &[]),
            entry("backend", OwnerType::Flux, "dev", &[]),
        ];
        let q1 = Query::parse("owner=Flux").unwrap();
        let q2 = Query::parse("namespace=prod").unwrap();
        let and = Query::parse("owner=Flux AND namespace=prod").unwrap();
        for e in &entries {
            if and.matches(e) {
                assert!(q1.matches(e) && q2.matches(e));
            }
        }
    }

    #[test]
    fn invalid_regex_fails_parse() {
        assert!(Query::parse("name~=(unterminated").is_err());
    }
}
