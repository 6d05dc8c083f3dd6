//! Query derivation from method names such as `findByFirstNameAndLastName`.

use std::fmt;

use kindred_codec::Native;

use crate::condition::{Condition, Direction, Operator, Order, PredicateQuery, PropertyPath, Sort};
use crate::error::{QueryError, QueryResult};

/// What a derived query does with its matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    Find,
    Count,
    Exists,
    Delete,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Find => "find",
            Self::Count => "count",
            Self::Exists => "exists",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

const SUBJECTS: &[(&str, Subject)] = &[
    ("find", Subject::Find),
    ("read", Subject::Find),
    ("get", Subject::Find),
    ("query", Subject::Find),
    ("search", Subject::Find),
    ("stream", Subject::Find),
    ("count", Subject::Count),
    ("exists", Subject::Exists),
    ("delete", Subject::Delete),
    ("remove", Subject::Delete),
];

/// The predicate keyword of one part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
    Equals,
    IsNull,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Before,
    After,
    Containing,
    In,
}

impl Keyword {
    fn takes_argument(self) -> bool {
        self != Self::IsNull
    }
}

/// Predicate suffixes. `None` marks keywords with no condition form; the
/// longest matching suffix wins.
const KEYWORDS: &[(&str, Option<Keyword>)] = &[
    ("AllIgnoringCase", None),
    ("IsNotContaining", None),
    ("IsGreaterThanEqual", Some(Keyword::GreaterThanEqual)),
    ("GreaterThanEqual", Some(Keyword::GreaterThanEqual)),
    ("IsStartingWith", None),
    ("AllIgnoreCase", None),
    ("IsLessThanEqual", Some(Keyword::LessThanEqual)),
    ("IsGreaterThan", Some(Keyword::GreaterThan)),
    ("NotContaining", None),
    ("LessThanEqual", Some(Keyword::LessThanEqual)),
    ("IsEndingWith", None),
    ("IsContaining", Some(Keyword::Containing)),
    ("IgnoringCase", None),
    ("StartingWith", None),
    ("GreaterThan", Some(Keyword::GreaterThan)),
    ("MatchesRegex", None),
    ("IsNotEmpty", None),
    ("IsLessThan", Some(Keyword::LessThan)),
    ("IgnoreCase", None),
    ("EndingWith", None),
    ("Containing", Some(Keyword::Containing)),
    ("IsNotNull", None),
    ("IsBetween", None),
    ("StartsWith", None),
    ("IsNotLike", None),
    ("NotEmpty", None),
    ("LessThan", Some(Keyword::LessThan)),
    ("IsBefore", Some(Keyword::Before)),
    ("EndsWith", None),
    ("Contains", Some(Keyword::Containing)),
    ("IsWithin", None),
    ("NotLike", None),
    ("NotNull", None),
    ("IsAfter", Some(Keyword::After)),
    ("IsEmpty", None),
    ("IsFalse", None),
    ("Between", None),
    ("IsNotIn", None),
    ("Matches", None),
    ("IsNull", Some(Keyword::IsNull)),
    ("Equals", Some(Keyword::Equals)),
    ("Before", Some(Keyword::Before)),
    ("IsTrue", None),
    ("IsLike", None),
    ("Within", None),
    ("IsNear", None),
    ("IsNot", None),
    ("NotIn", None),
    ("After", Some(Keyword::After)),
    ("Empty", None),
    ("False", None),
    ("Regex", None),
    ("Exists", None),
    ("Null", Some(Keyword::IsNull)),
    ("True", None),
    ("Like", None),
    ("IsIn", Some(Keyword::In)),
    ("Near", None),
    ("Not", None),
    ("Is", Some(Keyword::Equals)),
    ("In", Some(Keyword::In)),
];

/// One `<Property><Keyword>` part of a predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub path: PropertyPath,
    pub keyword: Keyword,
}

impl Part {
    fn into_condition(self, value: Option<Native>) -> Condition {
        let path = self.path;
        let compare = |operator, value: Option<Native>| Condition::Comparison {
            path: path.clone(),
            operator,
            value: value.unwrap_or_default(),
        };
        match self.keyword {
            Keyword::Equals => Condition::EqualTo {
                path: path.clone(),
                value: value.unwrap_or_default(),
            },
            Keyword::IsNull => Condition::IsNull { path: path.clone() },
            Keyword::GreaterThan | Keyword::After => compare(Operator::GreaterThan, value),
            Keyword::GreaterThanEqual => compare(Operator::GreaterThanOrEqualTo, value),
            Keyword::LessThan | Keyword::Before => compare(Operator::LessThan, value),
            Keyword::LessThanEqual => compare(Operator::LessThanOrEqualTo, value),
            Keyword::Containing => compare(Operator::Contains, value),
            Keyword::In => compare(Operator::In, value),
        }
    }
}

/// A parsed query method name.
///
/// The predicate is a disjunction of conjunctions of parts, in method-name
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryMethod {
    name: String,
    subject: Subject,
    predicate: Vec<Vec<Part>>,
    sort: Sort,
}

impl QueryMethod {
    pub fn parse(name: &str) -> QueryResult<Self> {
        let invalid = |reason: &str| QueryError::InvalidMethodName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let (verb, subject) = SUBJECTS
            .iter()
            .find(|(verb, _)| {
                name.strip_prefix(verb)
                    .is_some_and(starts_upper)
            })
            .copied()
            .ok_or_else(|| invalid("no query verb"))?;

        let rest = &name[verb.len()..];
        let by = rest.find("By").ok_or_else(|| invalid("missing `By`"))?;
        let criteria = &rest[by + 2..];

        let (predicate_text, sort_text) = match criteria.find("OrderBy") {
            Some(at) => (&criteria[..at], Some(&criteria[at + 7..])),
            None => (criteria, None),
        };
        if predicate_text.is_empty() {
            return Err(invalid("empty predicate"));
        }

        let mut predicate = Vec::new();
        for disjunct in split_keyword(predicate_text, "Or") {
            let mut parts = Vec::new();
            for conjunct in split_keyword(disjunct, "And") {
                parts.push(parse_part(name, conjunct)?);
            }
            predicate.push(parts);
        }

        let sort = match sort_text {
            Some(text) => parse_sort(name, text)?,
            None => Sort::unsorted(),
        };

        Ok(Self {
            name: name.to_string(),
            subject,
            predicate,
            sort,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Disjuncts of the predicate, each a conjunction of parts.
    pub fn predicate(&self) -> &[Vec<Part>] {
        &self.predicate
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Number of arguments the method consumes.
    pub fn argument_count(&self) -> usize {
        self.predicate
            .iter()
            .flatten()
            .filter(|part| part.keyword.takes_argument())
            .count()
    }

    /// Check that this method was declared with the expected verb.
    pub fn expect_subject(&self, expected: Subject) -> QueryResult<&Self> {
        if self.subject != expected {
            return Err(QueryError::WrongSubject {
                name: self.name.clone(),
                expected,
                found: self.subject,
            });
        }
        Ok(self)
    }

    /// Bind call arguments, in order, to the predicate parts.
    pub fn bind(&self, args: Vec<Native>) -> QueryResult<PredicateQuery> {
        let expected = self.argument_count();
        if args.len() != expected {
            return Err(QueryError::ArgumentCount {
                name: self.name.clone(),
                expected,
                actual: args.len(),
            });
        }

        let mut args = args.into_iter();
        let mut condition: Option<Condition> = None;
        for parts in &self.predicate {
            let mut conjunction: Option<Condition> = None;
            for part in parts {
                let value = if part.keyword.takes_argument() {
                    args.next()
                } else {
                    None
                };
                let leaf = part.clone().into_condition(value);
                conjunction = Some(match conjunction {
                    Some(acc) => acc.and(leaf),
                    None => leaf,
                });
            }
            if let Some(conjunction) = conjunction {
                condition = Some(match condition {
                    Some(acc) => acc.or(conjunction),
                    None => conjunction,
                });
            }
        }

        let condition = condition.ok_or_else(|| QueryError::InvalidMethodName {
            name: self.name.clone(),
            reason: "empty predicate".into(),
        })?;
        Ok(PredicateQuery::new(condition).sorted(self.sort.clone()))
    }
}

fn starts_upper(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

/// Split on `keyword` where it is followed by an uppercase letter.
fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(offset) = text[search..].find(keyword) {
        let at = search + offset;
        let after = at + keyword.len();
        if at > start && starts_upper(&text[after..]) {
            pieces.push(&text[start..at]);
            start = after;
        }
        search = after;
    }
    pieces.push(&text[start..]);
    pieces
}

fn parse_part(name: &str, text: &str) -> QueryResult<Part> {
    let (property, keyword) = match KEYWORDS
        .iter()
        .filter(|(suffix, _)| text.len() > suffix.len() && text.ends_with(suffix))
        .max_by_key(|(suffix, _)| suffix.len())
    {
        Some((suffix, Some(keyword))) => (&text[..text.len() - suffix.len()], *keyword),
        Some((suffix, None)) => {
            return Err(QueryError::UnsupportedKeyword {
                name: name.to_string(),
                keyword: suffix.to_string(),
            })
        }
        None => (text, Keyword::Equals),
    };
    Ok(Part {
        path: parse_path(name, property)?,
        keyword,
    })
}

/// `Address_City` becomes `address.city`.
fn parse_path(name: &str, text: &str) -> QueryResult<PropertyPath> {
    let segments: Vec<String> = text.split('_').map(decapitalize).collect();
    if segments.iter().any(String::is_empty) {
        return Err(QueryError::InvalidMethodName {
            name: name.to_string(),
            reason: format!("empty property in `{text}`"),
        });
    }
    Ok(PropertyPath::new(segments))
}

/// Lowercase the first letter unless the name starts with two capitals
/// (`URL` stays `URL`).
fn decapitalize(text: &str) -> String {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            text.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(text[first.len_utf8()..].chars()).collect(),
        (None, _) => String::new(),
    }
}

fn parse_sort(name: &str, text: &str) -> QueryResult<Sort> {
    let mut orders = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let (property, direction, consumed) = match next_direction(rest) {
            Some((at, direction, len)) => (&rest[..at], direction, at + len),
            None => (rest, Direction::Asc, rest.len()),
        };
        orders.push(Order {
            property: parse_path(name, property)?,
            direction,
        });
        rest = &rest[consumed..];
    }
    if orders.is_empty() {
        return Err(QueryError::InvalidMethodName {
            name: name.to_string(),
            reason: "empty OrderBy clause".into(),
        });
    }
    Ok(Sort::by(orders))
}

/// First `Asc`/`Desc` that ends the text or precedes an uppercase letter.
fn next_direction(text: &str) -> Option<(usize, Direction, usize)> {
    (1..text.len())
        .filter(|&at| text.is_char_boundary(at))
        .find_map(|at| {
            let tail = &text[at..];
            [("Desc", Direction::Desc), ("Asc", Direction::Asc)]
                .into_iter()
                .find(|(word, _)| {
                    tail.strip_prefix(word)
                        .is_some_and(|after| after.is_empty() || starts_upper(after))
                })
                .map(|(word, direction)| (at, direction, word.len()))
        })
}
