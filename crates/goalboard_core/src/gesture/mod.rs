//! Gesture recognition and swipe feedback.
//!
//! # Responsibility
//! - Recognize horizontal swipes per goal row (`tracker`).
//! - Project swipe progress to visual state (`feedback`).
//! - Map commit direction to a goal status change (`CommitPolicy`).
//!
//! # Invariants
//! - Nothing here reads or mutates goal data.

pub mod feedback;
pub mod tracker;

use crate::model::goal::GoalStatus;
use tracker::SwipeDirection;

/// Direction-to-status rule for swipe commits.
pub struct CommitPolicy;

impl CommitPolicy {
    /// Returns the status a commit should produce, or `None` to discard it.
    ///
    /// Right completes a todo goal, left reopens a done goal.
    pub fn resolve(direction: SwipeDirection, current: GoalStatus) -> Option<GoalStatus> {
        match (direction, current) {
            (SwipeDirection::Right, GoalStatus::Todo) => Some(GoalStatus::Done),
            (SwipeDirection::Left, GoalStatus::Done) => Some(GoalStatus::Todo),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CommitPolicy;
    use crate::gesture::tracker::SwipeDirection;
    use crate::model::goal::GoalStatus;

    #[test]
    fn wrong_direction_commits_are_discarded() {
        assert_eq!(
            CommitPolicy::resolve(SwipeDirection::Right, GoalStatus::Todo),
            Some(GoalStatus::Done)
        );
        assert_eq!(
            CommitPolicy::resolve(SwipeDirection::Left, GoalStatus::Done),
            Some(GoalStatus::Todo)
        );
        assert_eq!(CommitPolicy::resolve(SwipeDirection::Left, GoalStatus::Todo), None);
        assert_eq!(CommitPolicy::resolve(SwipeDirection::Right, GoalStatus::Done), None);
        assert_eq!(CommitPolicy::resolve(SwipeDirection::None, GoalStatus::Todo), None);
    }
}
