//! Board error taxonomy and user-facing notices.

use crate::model::goal::{GoalId, GoalValidationError};
use crate::remote::{RemoteError, TransportFailure};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Request was malformed; nothing was applied.
    Validation,
    /// Request collided with local state; nothing was applied.
    ConflictGuard,
    /// Remote call failed; local state was rolled back.
    Transport,
}

/// Errors from board mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    Validation(GoalValidationError),
    /// Goal has not been confirmed by the remote service yet.
    ProvisionalGoal(GoalId),
    GoalNotFound(GoalId),
    /// Another mutation for this goal is in flight.
    MutationPending(GoalId),
    Transport(RemoteError),
}

impl BoardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ProvisionalGoal(_) | Self::GoalNotFound(_) | Self::MutationPending(_) => {
                ErrorKind::ConflictGuard
            }
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Short code for log lines.
    pub fn code(&self) -> String {
        match self {
            Self::Validation(_) => "validation".to_string(),
            Self::ProvisionalGoal(_) => "provisional_goal".to_string(),
            Self::GoalNotFound(_) => "goal_not_found".to_string(),
            Self::MutationPending(_) => "mutation_pending".to_string(),
            Self::Transport(err) => err.code(),
        }
    }

    /// Message suitable for a transient banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::ProvisionalGoal(_) => {
                "This goal is still being saved. Try again in a moment.".to_string()
            }
            Self::GoalNotFound(_) => "This goal is no longer on the board.".to_string(),
            Self::MutationPending(_) => "This goal is already being updated.".to_string(),
            Self::Transport(err) => match err.classify() {
                TransportFailure::NotFound => {
                    "The goal no longer exists on the server.".to_string()
                }
                TransportFailure::Server => {
                    "The server could not process the request. Please try again.".to_string()
                }
                TransportFailure::Connectivity => {
                    "Could not reach the server. Check your connection and try again."
                        .to_string()
                }
            },
        }
    }
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProvisionalGoal(id) => write!(f, "goal is not confirmed yet: {id}"),
            Self::GoalNotFound(id) => write!(f, "goal not found: {id}"),
            Self::MutationPending(id) => write!(f, "mutation already pending for goal: {id}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GoalValidationError> for BoardError {
    fn from(value: GoalValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RemoteError> for BoardError {
    fn from(value: RemoteError) -> Self {
        Self::Transport(value)
    }
}

/// Transient notice for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&BoardError> for Notice {
    fn from(value: &BoardError) -> Self {
        Self {
            kind: value.kind(),
            message: value.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardError, ErrorKind, Notice};
    use crate::model::goal::GoalId;
    use crate::remote::RemoteError;

    #[test]
    fn transport_messages_follow_classification() {
        let not_found = BoardError::Transport(RemoteError::not_found("gone"));
        let server = BoardError::Transport(RemoteError::server("boom"));
        let offline = BoardError::Transport(RemoteError::Network("dns".to_string()));

        assert!(not_found.user_message().contains("no longer exists"));
        assert!(server.user_message().contains("server could not"));
        assert!(offline.user_message().contains("Could not reach"));
        assert_eq!(offline.code(), "network");
    }

    #[test]
    fn guard_errors_map_to_conflict_guard_notice() {
        let err = BoardError::MutationPending(GoalId::confirmed("g1"));
        let notice = Notice::from(&err);
        assert_eq!(notice.kind, ErrorKind::ConflictGuard);
        assert_eq!(notice.message, "This goal is already being updated.");
    }
}
