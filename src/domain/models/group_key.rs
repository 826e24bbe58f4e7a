//! Grouping key bucketing records into ordered lists.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{RepoError, RepoResult};

/// Discriminant of a [`GroupKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Records without any date.
    NoGroup,
    /// Records pinned to a concrete calendar date.
    Fixed,
    /// Records parked until further notice.
    Pending,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoGroup => "NO_GROUP",
            Self::Fixed => "FIXED",
            Self::Pending => "PENDING",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NO_GROUP" => Some(Self::NoGroup),
            "FIXED" => Some(Self::Fixed),
            "PENDING" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Immutable classification value bucketing records into lists.
///
/// A `Fixed` key always carries a date; the other kinds never do. Two keys
/// with equal kind and date compare equal — all fast paths in the crate rely
/// on value equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    kind: GroupKind,
    date: Option<NaiveDate>,
}

impl GroupKey {
    /// Build a key from its parts, validating the kind/date pairing.
    pub fn new(kind: GroupKind, date: Option<NaiveDate>) -> RepoResult<Self> {
        match (kind, date) {
            (GroupKind::Fixed, None) => Err(RepoError::InvalidArgument(
                "a date is required for the FIXED kind".to_string(),
            )),
            (GroupKind::NoGroup | GroupKind::Pending, Some(_)) => Err(RepoError::InvalidArgument(
                format!("kind {} does not take a date", kind.as_str()),
            )),
            _ => Ok(Self { kind, date }),
        }
    }

    pub fn no_group() -> Self {
        Self {
            kind: GroupKind::NoGroup,
            date: None,
        }
    }

    pub fn pending() -> Self {
        Self {
            kind: GroupKind::Pending,
            date: None,
        }
    }

    pub fn fixed(date: NaiveDate) -> Self {
        Self {
            kind: GroupKind::Fixed,
            date: Some(date),
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Two-part persisted encoding: `"<KIND>|<ISO-8601-date-or-empty>"`.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode the persisted encoding, rejecting unknown kind tokens and
    /// malformed dates. An empty second part means no date.
    pub fn decode(s: &str) -> RepoResult<Self> {
        s.parse()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{}|{}", self.kind.as_str(), date),
            None => write!(f, "{}|", self.kind.as_str()),
        }
    }
}

impl FromStr for GroupKey {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind_token, date_part) = s.split_once('|').unwrap_or((s, ""));
        let kind = GroupKind::from_str(kind_token)
            .ok_or_else(|| RepoError::InvalidArgument(format!("unknown group kind: {kind_token}")))?;
        let date = if date_part.is_empty() {
            None
        } else {
            Some(date_part.parse::<NaiveDate>().map_err(|e| {
                RepoError::InvalidArgument(format!("bad group date {date_part}: {e}"))
            })?)
        };
        Self::new(kind, date)
    }
}
