//! Swipe progress to per-goal visual intensity.
//!
//! # Invariants
//! - `project` is pure: same inputs, same `VisualState`.
//! - `reset` always stores and returns the neutral state.
//! - `opacity` stays in `[0, max_opacity]`, `translate` in `[0, max_translate]`.

use crate::config::FeedbackConfig;
use crate::gesture::tracker::SwipeDirection;
use crate::model::goal::GoalId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rendering hint for one goal row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub direction: SwipeDirection,
    pub opacity: f64,
    pub active: bool,
    /// Unsigned offset; the host applies `direction` as the sign.
    pub translate: f64,
}

impl VisualState {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

/// Maps swipe progress to visual state and remembers the last one per goal.
#[derive(Debug, Clone, Default)]
pub struct SwipeFeedbackProjector {
    config: FeedbackConfig,
    last: HashMap<GoalId, VisualState>,
}

impl SwipeFeedbackProjector {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            last: HashMap::new(),
        }
    }

    /// Computes the visual state for `progress` in `direction`.
    pub fn project(&self, progress: f64, direction: SwipeDirection) -> VisualState {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        VisualState {
            direction,
            opacity: (progress * self.config.max_opacity).min(self.config.max_opacity),
            active: progress > self.config.active_progress,
            translate: (progress * self.config.max_translate).min(self.config.max_translate),
        }
    }

    /// Projects and records the state for `goal_id`.
    pub fn update(
        &mut self,
        goal_id: &GoalId,
        progress: f64,
        direction: SwipeDirection,
    ) -> VisualState {
        let state = self.project(progress, direction);
        self.last.insert(goal_id.clone(), state);
        state
    }

    /// Returns the last recorded state, neutral when none.
    pub fn current(&self, goal_id: &GoalId) -> VisualState {
        self.last.get(goal_id).copied().unwrap_or_default()
    }

    /// Drops recorded state for `goal_id` and returns neutral.
    pub fn reset(&mut self, goal_id: &GoalId) -> VisualState {
        self.last.remove(goal_id);
        VisualState::neutral()
    }
}
