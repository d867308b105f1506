//! Named database constraints and their classification.
//!
//! Constraint names come back from PostgreSQL in error reports; mapping them
//! to enum variants lets callers react to a specific violation without
//! matching on strings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Constraints declared on the `connections` table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum ConnectionConstraints {
    // Uniqueness constraints
    #[strum(serialize = "connections_connection_name_key")]
    NameUnique,

    // Data validation constraints
    #[strum(serialize = "connections_connection_name_not_empty")]
    NameNotEmpty,
    #[strum(serialize = "connections_port_range")]
    PortRange,

    // Chronological constraints
    #[strum(serialize = "connections_updated_after_created")]
    UpdatedAfterCreated,
}

impl ConnectionConstraints {
    /// Creates a new [`ConnectionConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::NameUnique => ConstraintCategory::Uniqueness,
            Self::NameNotEmpty | Self::PortRange => ConstraintCategory::Validation,
            Self::UpdatedAfterCreated => ConstraintCategory::Chronological,
        }
    }

    /// Returns the request field the constraint guards, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::NameUnique | Self::NameNotEmpty => Some("connection_name"),
            Self::PortRange => Some("port"),
            Self::UpdatedAfterCreated => None,
        }
    }
}

impl From<ConnectionConstraints> for String {
    #[inline]
    fn from(val: ConnectionConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for ConnectionConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Any known constraint violation, grouped by table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Connection(ConnectionConstraints),
}

/// Categories of database constraint violations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintCategory {
    /// Format, length and range checks.
    Validation,
    /// Timestamp ordering checks.
    Chronological,
    /// Primary keys and unique indexes.
    Uniqueness,
}

impl ConstraintViolation {
    /// Resolves a constraint name reported by PostgreSQL.
    ///
    /// ```
    /// use insight_postgres::types::ConstraintViolation;
    ///
    /// assert!(ConstraintViolation::new("connections_connection_name_key").is_some());
    /// assert!(ConstraintViolation::new("unknown_constraint").is_none());
    /// ```
    pub fn new(constraint: &str) -> Option<Self> {
        match constraint.split('_').next()? {
            "connections" => ConnectionConstraints::new(constraint).map(Self::Connection),
            _ => None,
        }
    }

    /// Returns the table the constraint is declared on.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connections",
        }
    }

    /// Returns the category of this constraint violation.
    pub fn categorize(&self) -> ConstraintCategory {
        match self {
            Self::Connection(c) => c.categorize(),
        }
    }

    /// Returns the request field the constraint guards, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Connection(c) => c.field(),
        }
    }
}
