//! Remote goal service contract.
//!
//! # Responsibility
//! - Define the request/response shapes the board exchanges with the
//!   authoritative goal service.
//! - Classify transport failures for user-facing messages.
//!
//! # Invariants
//! - Each call resolves exactly once, to a value or a `RemoteError`.
//! - Remote responses are authoritative over local optimistic state.

pub mod sqlite;

use crate::model::goal::{Goal, GoalStatus, NewGoal};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;

pub use sqlite::SqliteGoalRemote;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Goal list for one space, split by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalListSnapshot {
    pub space_id: String,
    pub total_count: usize,
    pub done_count: usize,
    pub completion_rate: u32,
    pub done_goals: Vec<Goal>,
    pub todo_goals: Vec<Goal>,
}

impl GoalListSnapshot {
    /// Empty snapshot for a space with no goals.
    pub fn empty(space_id: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            ..Self::default()
        }
    }

    /// Flattens to one collection, done goals first.
    pub fn into_goals(self) -> Vec<Goal> {
        let mut goals = self.done_goals;
        goals.extend(self.todo_goals);
        goals
    }
}

/// Response of a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub goal: Goal,
    pub message: String,
}

/// Response of a goal creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedGoal {
    pub goal: Goal,
    /// Service-assigned id; wins over `goal.id` when present.
    pub task_id: Option<String>,
}

/// Coarse failure class used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    NotFound,
    Server,
    Connectivity,
}

/// Failure of one remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Non-2xx response.
    Status { code: u16, message: String },
    /// Request never produced a response.
    Network(String),
    /// Transport deadline elapsed.
    Timeout,
    /// Response body did not match the expected shape.
    InvalidResponse(String),
}

impl RemoteError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Status {
            code: 404,
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Status {
            code: 500,
            message: message.into(),
        }
    }

    /// Classifies by status code where one is available.
    pub fn classify(&self) -> TransportFailure {
        match self {
            Self::Status { code: 404, .. } => TransportFailure::NotFound,
            Self::Status { code, .. } if *code >= 500 => TransportFailure::Server,
            Self::Status { .. } | Self::Network(_) | Self::Timeout | Self::InvalidResponse(_) => {
                TransportFailure::Connectivity
            }
        }
    }

    /// Short code for log lines.
    pub fn code(&self) -> String {
        match self {
            Self::Status { code, .. } => format!("http_{code}"),
            Self::Network(_) => "network".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::InvalidResponse(_) => "invalid_response".to_string(),
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { code, message } => write!(f, "HTTP {code}: {message}"),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::InvalidResponse(message) => write!(f, "invalid response: {message}"),
        }
    }
}

impl Error for RemoteError {}

/// Authoritative goal service.
///
/// Futures are awaited on a single-threaded executor and need not be `Send`.
pub trait GoalRemote {
    fn fetch_goal_list(&self, space_id: &str)
        -> impl Future<Output = RemoteResult<GoalListSnapshot>>;

    /// Sends the desired status together with the full goal snapshot.
    fn submit_goal_status(
        &self,
        goal_id: &str,
        status: GoalStatus,
        snapshot: &Goal,
    ) -> impl Future<Output = RemoteResult<StatusUpdate>>;

    fn submit_new_goal(
        &self,
        space_id: &str,
        goal: &NewGoal,
    ) -> impl Future<Output = RemoteResult<CreatedGoal>>;
}
