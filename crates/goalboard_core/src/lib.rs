//! Core logic for GoalBoard shared goal lists.
//! This crate owns the optimistic mutation and swipe gesture engine.

pub mod clock;
pub mod config;
pub mod db;
pub mod gesture;
pub mod logging;
pub mod model;
pub mod projection;
pub mod remote;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BoardConfig, ConfigError, FeedbackConfig, GestureConfig};
pub use gesture::feedback::{SwipeFeedbackProjector, VisualState};
pub use gesture::tracker::{GestureEvent, GestureSession, GestureTracker, Point, SwipeDirection};
pub use gesture::CommitPolicy;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::goal::{Goal, GoalId, GoalStatus, GoalValidationError, NewGoal};
pub use model::stats::DerivedStats;
pub use projection::goal_list::{
    project_goal_list, GoalListQuery, GoalListView, SortKey, StatusFilter,
};
pub use remote::{
    CreatedGoal, GoalListSnapshot, GoalRemote, RemoteError, RemoteResult, SqliteGoalRemote,
    StatusUpdate, TransportFailure,
};
pub use service::board::{CreateTicket, GoalBoard, PendingMutation, RefreshTicket, ToggleTicket};
pub use service::error::{BoardError, ErrorKind, Notice};
pub use service::session::{ContactFeedback, GoalSession};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
