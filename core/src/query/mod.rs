//! Query descriptor
//!
//! A [`QueryDescriptor`] is the dialect-independent description of one query.
//! [`QueryBuilder`] produces it one validated step at a time, a
//! [`SqlGenerator`](crate::generator::SqlGenerator) renders it into a
//! [`GeneratedQuery`].

mod builder;

pub use builder::{Batches, QueryBuilder};

use aggregated_types::Value;

use crate::error::{AggregatedError, Result};
use crate::metadata::RelationKind;

/// How a relation is materialized in the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMethod {
    /// `LEFT JOIN` + JSON object, to-one relations only
    SingleObject,
    /// Correlated subquery + JSON array, one-to-many only
    Collection,
    /// Correlated `COUNT(*)` subquery, one-to-many only
    Count,
}

/// One named relation or count on a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationConfig {
    pub name: String,
    pub kind: RelationKind,
    pub target: String,
    pub method: LoadMethod,
    /// Selected target columns, empty for counts
    pub columns: Vec<String>,
    /// Join column on the root table
    pub base_column: String,
    /// Join column on the target table
    pub related_column: String,
}

/// Insertion-ordered, name-unique set of relation configs.
///
/// Re-adding a name replaces the entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSet {
    entries: Vec<RelationConfig>,
}

impl RelationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: RelationConfig) {
        match self.entries.iter_mut().find(|c| c.name == config.name) {
            Some(slot) => *slot = config,
            None => self.entries.push(config),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RelationConfig> {
        self.entries.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RelationConfig> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RelationSet {
    type Item = &'a RelationConfig;
    type IntoIter = core::slice::Iter<'a, RelationConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<RelationConfig> for RelationSet {
    fn from_iter<I: IntoIterator<Item = RelationConfig>>(iter: I) -> Self {
        let mut set = Self::new();
        for config in iter {
            set.insert(config);
        }
        set
    }
}

/// Whitelisted comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    /// `!=`
    NotEq,
    /// `<>`
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Like,
    NotLike,
    In,
}

impl Operator {
    /// Parses an operator, ignoring case and repeated inner whitespace.
    ///
    /// ```
    /// use aggregated_core::query::Operator;
    ///
    /// assert_eq!(Operator::parse(" not   like "), Some(Operator::NotLike));
    /// assert_eq!(Operator::parse("<>"), Some(Operator::Ne));
    /// assert_eq!(Operator::parse("BETWEEN"), None);
    /// ```
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        let normalized = op
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        Some(match normalized.as_str() {
            "=" => Self::Eq,
            "!=" => Self::NotEq,
            "<>" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Lte,
            ">=" => Self::Gte,
            "LIKE" => Self::Like,
            "NOT LIKE" => Self::NotLike,
            "IN" => Self::In,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
        }
    }

    /// Operators that may be paired with NULL.
    #[must_use]
    pub const fn accepts_null(self) -> bool {
        matches!(self, Self::Eq | Self::NotEq | Self::Ne)
    }
}

impl core::fmt::Display for Operator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    /// Non-empty list, `IN` only
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPredicate {
    pub column: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl FilterPredicate {
    /// Checks the operator/value pairing.
    pub fn validate(&self) -> Result<()> {
        match (&self.value, self.operator) {
            (FilterValue::List(values), Operator::In) if values.is_empty() => Err(
                AggregatedError::invalid(format!("whereIn() requires a non-empty list for \"{}\"", self.column)),
            ),
            (FilterValue::List(_), Operator::In) => Ok(()),
            (FilterValue::List(_), op) => Err(AggregatedError::invalid(format!(
                "Operator \"{op}\" does not accept a list value (column \"{}\")",
                self.column
            ))),
            (FilterValue::Scalar(_), Operator::In) => Err(AggregatedError::invalid(format!(
                "Operator \"IN\" requires a list value (column \"{}\")",
                self.column
            ))),
            (FilterValue::Scalar(v), op) if v.is_null() && !op.accepts_null() => {
                Err(AggregatedError::UnsupportedNullComparison {
                    column: self.column.clone(),
                    operator: op.as_str().to_string(),
                })
            }
            (FilterValue::Scalar(_), _) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Case-insensitive `ASC` / `DESC`.
    #[must_use]
    pub fn parse(direction: &str) -> Option<Self> {
        let direction = direction.trim();
        if direction.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if direction.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

/// Everything a generator needs to render one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    /// Root entity type, empty until bound
    pub target: String,
    pub relations: RelationSet,
    pub counts: RelationSet,
    pub filters: Vec<FilterPredicate>,
    pub sorts: Vec<SortKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryDescriptor {
    /// Fresh descriptor bound to `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn is_bound(&self) -> bool {
        !self.target.is_empty()
    }

    /// Relation plus count entries.
    pub fn relation_count(&self) -> usize {
        self.relations.len() + self.counts.len()
    }
}

/// One rendered statement with its bound parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}
