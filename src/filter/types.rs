use super::value::FieldMap;
use serde::{Deserialize, Serialize};

// Nesting limits for field paths and logical filters.
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_LOGICAL_DEPTH: usize = 64;

/// Comparison applied to every leaf field of a selector. `Eq` is implicit on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorOp {
    #[default]
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl SelectorOp {
    /// Wire keyword, or `None` for implicit equality.
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Eq => None,
            Self::Gt => Some("$gt"),
            Self::Gte => Some("$gte"),
            Self::Lt => Some("$lt"),
            Self::Lte => Some("$lte"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }
}

/// Atomic predicate over one or more document fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub op: SelectorOp,
    pub fields: FieldMap,
}

impl Selector {
    /// Equality selector over `fields`.
    #[must_use]
    pub fn new(fields: impl Into<FieldMap>) -> Self {
        Self { op: SelectorOp::Eq, fields: fields.into() }
    }

    #[must_use]
    pub fn with_op(op: SelectorOp, fields: impl Into<FieldMap>) -> Self {
        Self { op, fields: fields.into() }
    }
}

/// Children of a logical filter: exactly one kind per filter.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalChildren {
    Selectors(Vec<Selector>),
    Logical(Vec<LogicalFilter>),
}

impl LogicalChildren {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Selectors(s) => s.len(),
            Self::Logical(l) => l.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub op: LogicalOp,
    pub children: LogicalChildren,
}

impl LogicalFilter {
    #[must_use]
    pub fn and(selectors: Vec<Selector>) -> Self {
        Self { op: LogicalOp::And, children: LogicalChildren::Selectors(selectors) }
    }

    #[must_use]
    pub fn or(selectors: Vec<Selector>) -> Self {
        Self { op: LogicalOp::Or, children: LogicalChildren::Selectors(selectors) }
    }

    #[must_use]
    pub fn nested(op: LogicalOp, filters: Vec<LogicalFilter>) -> Self {
        Self { op, children: LogicalChildren::Logical(filters) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Selector(Selector),
    Logical(LogicalFilter),
}

impl From<Selector> for Filter {
    fn from(s: Selector) -> Self {
        Self::Selector(s)
    }
}

impl From<LogicalFilter> for Filter {
    fn from(l: LogicalFilter) -> Self {
        Self::Logical(l)
    }
}

/// Field updates grouped by operator. Groups are emitted in declaration order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateFields {
    pub set: FieldMap,
    pub unset: Vec<String>,
    pub increment: FieldMap,
    pub decrement: FieldMap,
    pub multiply: FieldMap,
    pub divide: FieldMap,
}

impl UpdateFields {
    #[must_use]
    pub fn set(fields: impl Into<FieldMap>) -> Self {
        Self { set: fields.into(), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.unset.is_empty()
            && self.increment.is_empty()
            && self.decrement.is_empty()
            && self.multiply.is_empty()
            && self.divide.is_empty()
    }
}

/// Projection: either an include list or an exclude list, never both.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadFields {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ReadFields {
    #[must_use]
    pub fn include<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self { include: fields.into_iter().map(Into::into).collect(), exclude: Vec::new() }
    }

    #[must_use]
    pub fn exclude<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self { include: Vec::new(), exclude: fields.into_iter().map(Into::into).collect() }
    }
}
