use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Attendee response state for an event invitation.
///
/// The canonical domain keeps all five values; the SQLite schema variant
/// constrains the column to [`RsvpStatus::sqlite_subset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Pending,
    Accepted,
    Declined,
    Tentative,
    NoResponse,
}

impl RsvpStatus {
    pub const ALL: [RsvpStatus; 5] = [
        RsvpStatus::Pending,
        RsvpStatus::Accepted,
        RsvpStatus::Declined,
        RsvpStatus::Tentative,
        RsvpStatus::NoResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "pending",
            RsvpStatus::Accepted => "accepted",
            RsvpStatus::Declined => "declined",
            RsvpStatus::Tentative => "tentative",
            RsvpStatus::NoResponse => "no_response",
        }
    }

    /// Whether this status carries a response timestamp.
    pub fn is_responded(&self) -> bool {
        matches!(
            self,
            RsvpStatus::Accepted | RsvpStatus::Declined | RsvpStatus::Tentative
        )
    }

    /// Values allowed by the stricter SQLite schema variant.
    pub fn sqlite_subset() -> &'static [RsvpStatus] {
        &[
            RsvpStatus::Pending,
            RsvpStatus::Accepted,
            RsvpStatus::Declined,
        ]
    }

    /// Nearest in-subset value for the SQLite schema. Values without a
    /// recorded response collapse to `pending`; `tentative` also collapses
    /// to `pending`, and callers must clear `responded_at` alongside it.
    pub fn coerced_for_sqlite(&self) -> RsvpStatus {
        match self {
            RsvpStatus::Tentative | RsvpStatus::NoResponse => RsvpStatus::Pending,
            other => *other,
        }
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(RsvpStatus::Pending),
            "accepted" => Ok(RsvpStatus::Accepted),
            "declined" => Ok(RsvpStatus::Declined),
            "tentative" => Ok(RsvpStatus::Tentative),
            "no_response" => Ok(RsvpStatus::NoResponse),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Target SQL dialect for schema DDL and emitted INSERT scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDialect {
    Sqlite,
    MySql,
}

impl SqlDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::MySql => "mysql",
        }
    }

    /// Whether the dialect accepts the full five-value attendee status set.
    pub fn supports_full_status_enum(&self) -> bool {
        matches!(self, SqlDialect::MySql)
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialect {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sqlite" => Ok(SqlDialect::Sqlite),
            "mysql" => Ok(SqlDialect::MySql),
            other => Err(CoreError::UnknownDialect(other.to_string())),
        }
    }
}

/// How to treat statuses outside the target schema's allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Map unsupported values onto the subset (logged).
    #[default]
    Coerce,
    /// Fail emission on the first unsupported value.
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in RsvpStatus::ALL {
            assert_eq!(status.as_str().parse::<RsvpStatus>().unwrap(), status);
        }
    }

    #[test]
    fn responded_matches_subset_semantics() {
        assert!(RsvpStatus::Accepted.is_responded());
        assert!(RsvpStatus::Tentative.is_responded());
        assert!(!RsvpStatus::Pending.is_responded());
        assert!(!RsvpStatus::NoResponse.is_responded());
    }

    #[test]
    fn coercion_lands_inside_the_sqlite_subset() {
        for status in RsvpStatus::ALL {
            assert!(
                RsvpStatus::sqlite_subset().contains(&status.coerced_for_sqlite()),
                "{status} coerced outside subset"
            );
        }
    }
}
