use std::fmt;

use kindred_codec::Native;

/// A property path: one segment per nesting level.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path such as `address.city`.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The store property name: segments joined with `.`.
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl From<&str> for PropertyPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

/// Comparison operators a condition can name but translation rejects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Contains,
    In,
    HasAncestor,
    HasDescendant,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqualTo => "GreaterThanOrEqualTo",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqualTo => "LessThanOrEqualTo",
            Self::Contains => "Contains",
            Self::In => "In",
            Self::HasAncestor => "HasAncestor",
            Self::HasDescendant => "HasDescendant",
        };
        f.write_str(name)
    }
}

/// A predicate tree over property paths.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    EqualTo { path: PropertyPath, value: Native },
    IsNull { path: PropertyPath },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Comparison {
        path: PropertyPath,
        operator: Operator,
        value: Native,
    },
}

impl Condition {
    pub fn equal_to(path: impl Into<PropertyPath>, value: impl Into<Native>) -> Self {
        Self::EqualTo {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn is_null(path: impl Into<PropertyPath>) -> Self {
        Self::IsNull { path: path.into() }
    }

    pub fn comparison(
        path: impl Into<PropertyPath>,
        operator: Operator,
        value: impl Into<Native>,
    ) -> Self {
        Self::Comparison {
            path: path.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn and(self, other: Condition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EqualTo { path, value } => write!(f, "{path} == {value}"),
            Self::IsNull { path } => write!(f, "{path} IS NULL"),
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Comparison {
                path,
                operator,
                value,
            } => write!(f, "{path} {operator} {value}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One sort key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    pub property: PropertyPath,
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<PropertyPath>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<PropertyPath>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }
}

/// A sort specification. Carried with a query but not compiled into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, order) in self.orders.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let direction = match order.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            write!(f, "{} {direction}", order.property)?;
        }
        Ok(())
    }
}

/// A condition together with its sort specification.
#[derive(Clone, Debug, PartialEq)]
pub struct PredicateQuery {
    pub condition: Condition,
    pub sort: Sort,
}

impl PredicateQuery {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            sort: Sort::unsorted(),
        }
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }
}
