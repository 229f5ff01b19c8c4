//! Filter conditions for book queries
//!
//! A [`Condition`] is a small boolean expression tree: leaf [`Predicate`]s
//! (`=`, `LIKE`, `ILIKE`) joined by `AND`, `OR` and `NOT` combinators. Trees
//! are built with the fluent builder below or decoded from the compact JSON
//! wire shape (see [`wire`]), and compiled into a parameterized WHERE fragment
//! (see [`compile`]).
//!
//! # Example
//!
//! ```rust
//! use book_service::condition::Condition;
//!
//! let condition = Condition::new()
//!     .like("title", "harry potter")
//!     .not(Condition::new().equal("author", "Lord Voldermort"));
//!
//! let compiled = condition.compile();
//! assert_eq!(compiled.text, "title LIKE ? AND NOT (author = ?)");
//! assert_eq!(compiled.params.len(), 2);
//! ```

mod compile;
mod error;
mod wire;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use compile::{CompileOptions, CompiledWhere, IlikeSupport, Placeholder};
pub use error::ConditionError;

/// Operator joining the entries of a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    /// All entries must hold
    #[default]
    And,
    /// At least one entry must hold
    Or,
    /// Negates its single entry
    Not,
}

impl Combinator {
    /// Wire and SQL spelling of the operator
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }

    /// Parse the wire spelling; operators are case sensitive
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            _ => None,
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a leaf [`Predicate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafOperator {
    /// Equality (=)
    Equal,
    /// Pattern match (LIKE)
    Like,
    /// Case-insensitive pattern match (ILIKE)
    ILike,
}

impl LeafOperator {
    /// Wire and SQL spelling of the operator
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
        }
    }

    /// Parse the wire spelling; operators are case sensitive
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(Self::Equal),
            "LIKE" => Some(Self::Like),
            "ILIKE" => Some(Self::ILike),
            _ => None,
        }
    }

    /// Whether the operator only accepts text values
    #[must_use]
    pub const fn requires_text(&self) -> bool {
        matches!(self, Self::Like | Self::ILike)
    }
}

impl fmt::Display for LeafOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar compared against a column
///
/// Serializes as a bare JSON string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text value
    Text(String),
    /// Integral number
    Integer(i64),
    /// Non-integral (or out of `i64` range) number
    Float(f64),
}

impl Value {
    /// Returns the text if this is a text value
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

/// A single `field operator value` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: String,
    operator: LeafOperator,
    value: Value,
}

impl Predicate {
    /// Create a predicate, enforcing the leaf invariants
    ///
    /// The field must be non-empty and `LIKE`/`ILIKE` only accept text.
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::condition::{LeafOperator, Predicate, Value};
    ///
    /// assert!(Predicate::new("title", LeafOperator::Like, Value::from("%x%")).is_ok());
    /// assert!(Predicate::new("title", LeafOperator::Like, Value::from(3)).is_err());
    /// ```
    pub fn new(
        field: impl Into<String>,
        operator: LeafOperator,
        value: Value,
    ) -> Result<Self, ConditionError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConditionError::empty_field(operator.as_str()));
        }
        if operator.requires_text() && value.as_text().is_none() {
            return Err(ConditionError::UnsupportedTypeValue {
                value: value.to_string(),
                raw: format!("{{o: {operator}, f: {field}, v: {value}}}"),
            });
        }
        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Column name compared by this predicate
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Comparison operator
    #[must_use]
    pub fn operator(&self) -> LeafOperator {
        self.operator
    }

    /// Value bound for the comparison
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    // Builder-only constructor; callers guarantee the invariants statically.
    fn unchecked(field: impl Into<String>, operator: LeafOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Entry of a [`Condition`]: a leaf comparison or a nested group
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf comparison
    Leaf(Predicate),
    /// Nested combinator
    Group(Condition),
}

/// Combinator node and root of a condition tree
///
/// Entries keep their insertion order, which fixes the order of the compiled
/// SQL fragments and of the bound parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    operator: Combinator,
    entries: Vec<Node>,
}

impl Condition {
    /// Empty `AND` condition
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Combinator joining the entries
    #[must_use]
    pub fn operator(&self) -> Combinator {
        self.operator
    }

    /// Entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[Node] {
        &self.entries
    }

    /// True when the condition has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `field = value`
    #[must_use]
    pub fn equal(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push(Node::Leaf(Predicate::unchecked(
            field,
            LeafOperator::Equal,
            value.into(),
        )));
        self
    }

    /// Append `field LIKE '%value%'` (substring match)
    #[must_use]
    pub fn like(mut self, field: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.entries.push(Node::Leaf(Predicate::unchecked(
            field,
            LeafOperator::Like,
            Value::Text(wrap_wildcards(value.as_ref())),
        )));
        self
    }

    /// Append `field ILIKE '%value%'` (case-insensitive substring match)
    #[must_use]
    pub fn ilike(mut self, field: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.entries.push(Node::Leaf(Predicate::unchecked(
            field,
            LeafOperator::ILike,
            Value::Text(wrap_wildcards(value.as_ref())),
        )));
        self
    }

    /// Append the entries of `sub` as a single `OR` group
    ///
    /// `sub` is consumed, so it cannot be reused in another role. An empty
    /// `sub` adds nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::condition::Condition;
    ///
    /// let condition = Condition::new().like("title", "harry potter").or(Condition::new()
    ///     .equal("author", "Lord Voldermort")
    ///     .equal("author", "Tom Malvolo Riddle"));
    ///
    /// assert_eq!(
    ///     condition.compile().text,
    ///     "title LIKE ? AND (author = ? OR author = ?)"
    /// );
    /// ```
    #[must_use]
    pub fn or(mut self, sub: Condition) -> Self {
        if sub.is_empty() {
            return self;
        }
        self.entries.push(Node::Group(Condition {
            operator: Combinator::Or,
            entries: sub.entries,
        }));
        self
    }

    /// Append `NOT (sub)`; an empty `sub` adds nothing
    #[must_use]
    pub fn not(mut self, sub: Condition) -> Self {
        if sub.is_empty() {
            return self;
        }
        self.entries.push(Node::Group(Condition {
            operator: Combinator::Not,
            entries: vec![Node::Group(sub)],
        }));
        self
    }

    /// Every leaf predicate, depth-first in insertion order
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> + '_ {
        let mut out = Vec::new();
        collect_predicates(self, &mut out);
        out.into_iter()
    }

    /// Field names referenced by the leaves, depth-first in insertion order
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.predicates().map(Predicate::field)
    }
}

fn collect_predicates<'a>(condition: &'a Condition, out: &mut Vec<&'a Predicate>) {
    for entry in &condition.entries {
        match entry {
            Node::Leaf(predicate) => out.push(predicate),
            Node::Group(group) => collect_predicates(group, out),
        }
    }
}

fn wrap_wildcards(value: &str) -> String {
    format!("%{value}%")
}
