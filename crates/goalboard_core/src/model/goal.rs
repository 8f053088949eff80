//! Goal domain model.
//!
//! # Responsibility
//! - Define the canonical goal record shared by the board, projection and
//!   remote layers.
//! - Keep confirmed and provisional identities apart at the type level.
//!
//! # Invariants
//! - A `GoalId::Provisional` goal has no remote counterpart yet.
//! - `due_on` starts with a `YYYY-MM-DD` calendar date when set.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static DUE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ].*)?$").expect("valid due date regex")
});

/// Goal identity.
///
/// Confirmed ids are assigned by the remote service. Provisional ids are
/// minted locally for optimistic creates and are replaced on confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalId {
    Confirmed(String),
    Provisional(Uuid),
}

impl GoalId {
    /// Creates a confirmed id from a remote identifier.
    pub fn confirmed(id: impl Into<String>) -> Self {
        Self::Confirmed(id.into())
    }

    /// Mints a fresh provisional id.
    pub fn provisional() -> Self {
        Self::Provisional(Uuid::new_v4())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    /// Returns the remote identifier, or `None` for provisional ids.
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Self::Confirmed(id) => Some(id.as_str()),
            Self::Provisional(_) => None,
        }
    }
}

impl Display for GoalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed(id) => write!(f, "{id}"),
            Self::Provisional(local) => write!(f, "provisional:{local}"),
        }
    }
}

/// Goal completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Todo,
    Done,
}

impl GoalStatus {
    /// Returns the opposite status.
    pub fn flipped(self) -> Self {
        match self {
            Self::Todo => Self::Done,
            Self::Done => Self::Todo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Done => "done",
        }
    }

    /// Parses the wire form (`todo|done`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "todo" => Some(Self::Todo),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Canonical goal record held by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    pub detail: Option<String>,
    pub assignee: Option<String>,
    /// Calendar date, `YYYY-MM-DD` with an optional time suffix.
    pub due_on: Option<String>,
    pub status: GoalStatus,
    /// Unix epoch milliseconds.
    pub created_at_ms: i64,
    /// Unix epoch milliseconds.
    pub updated_at_ms: i64,
}

impl Goal {
    /// Creates a confirmed todo goal stamped with `now_ms`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: GoalId::confirmed(id),
            title: title.into(),
            detail: None,
            assignee: None,
            due_on: None,
            status: GoalStatus::Todo,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Builds the provisional record shown while a create is in flight.
    pub fn provisional(draft: &NewGoal, now_ms: i64) -> Self {
        Self {
            id: GoalId::provisional(),
            title: draft.title.clone(),
            detail: draft.detail.clone(),
            assignee: Some(draft.assignee.clone()),
            due_on: Some(draft.due_on.clone()),
            status: GoalStatus::Todo,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == GoalStatus::Done
    }

    /// Returns `(year, month, day)` parsed from `due_on`.
    ///
    /// Returns `None` when the date is absent or malformed.
    pub fn due_date(&self) -> Option<(i32, u32, u32)> {
        self.due_on.as_deref().and_then(parse_due_date)
    }
}

/// Create request for a new goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    pub assignee: String,
    pub due_on: String,
    pub detail: Option<String>,
}

impl NewGoal {
    pub fn new(
        title: impl Into<String>,
        assignee: impl Into<String>,
        due_on: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            assignee: assignee.into(),
            due_on: due_on.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns a trimmed copy after checking required fields.
    ///
    /// A blank `detail` is normalized to `None`.
    pub fn validate(&self) -> Result<Self, GoalValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(GoalValidationError::MissingField("title"));
        }
        let assignee = self.assignee.trim();
        if assignee.is_empty() {
            return Err(GoalValidationError::MissingField("assignee"));
        }
        let due_on = self.due_on.trim();
        if due_on.is_empty() {
            return Err(GoalValidationError::MissingField("due_on"));
        }
        if parse_due_date(due_on).is_none() {
            return Err(GoalValidationError::InvalidDueDate(due_on.to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            assignee: assignee.to_string(),
            due_on: due_on.to_string(),
            detail: self
                .detail
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        })
    }
}

/// Validation failures for goal create requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    /// A required field is blank after trim.
    MissingField(&'static str),
    /// `due_on` is not a `YYYY-MM-DD` calendar date.
    InvalidDueDate(String),
}

impl Display for GoalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::InvalidDueDate(value) => {
                write!(f, "due_on must be a YYYY-MM-DD date, got `{value}`")
            }
        }
    }
}

impl Error for GoalValidationError {}

/// Parses the leading calendar date of a due-date string.
pub fn parse_due_date(value: &str) -> Option<(i32, u32, u32)> {
    let captures = DUE_DATE_RE.captures(value.trim())?;
    let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
    let month = captures.get(2)?.as_str().parse::<u32>().ok()?;
    let day = captures.get(3)?.as_str().parse::<u32>().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((year, month, day))
}

#[cfg(test)]
mod tests {
    use super::{parse_due_date, GoalId, GoalStatus, GoalValidationError, NewGoal};

    #[test]
    fn parse_due_date_accepts_date_and_datetime() {
        assert_eq!(parse_due_date("2024-01-10"), Some((2024, 1, 10)));
        assert_eq!(parse_due_date("2024-01-10T08:00:00Z"), Some((2024, 1, 10)));
        assert_eq!(parse_due_date("2024-13-01"), None);
        assert_eq!(parse_due_date("soon"), None);
    }

    #[test]
    fn validate_trims_and_drops_blank_detail() {
        let draft = NewGoal::new("  Ship  ", " aki ", "2024-02-01").with_detail("   ");
        let valid = draft.validate().unwrap();
        assert_eq!(valid.title, "Ship");
        assert_eq!(valid.assignee, "aki");
        assert_eq!(valid.detail, None);
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let err = NewGoal::new("Ship", "", "").validate().unwrap_err();
        assert_eq!(err, GoalValidationError::MissingField("assignee"));
    }

    #[test]
    fn provisional_ids_have_no_remote_id() {
        assert!(GoalId::provisional().remote_id().is_none());
        assert_eq!(GoalId::confirmed("g1").remote_id(), Some("g1"));
        assert_eq!(GoalStatus::Todo.flipped(), GoalStatus::Done);
    }
}
