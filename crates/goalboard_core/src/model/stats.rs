//! Aggregates derived from the canonical goal collection.
//!
//! # Invariants
//! - `completion_rate == round(done_count / total_count * 100)` when
//!   `total_count > 0`, else `0`.
//! - Stats are recomputed from goals on every read and never stored.

use crate::model::goal::Goal;
use serde::{Deserialize, Serialize};

/// Counts and completion percentage for a goal collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub total_count: usize,
    pub done_count: usize,
    /// Integer percentage in `0..=100`.
    pub completion_rate: u32,
}

impl DerivedStats {
    /// Computes stats for `goals`.
    pub fn from_goals<'a>(goals: impl IntoIterator<Item = &'a Goal>) -> Self {
        let mut total_count = 0;
        let mut done_count = 0;
        for goal in goals {
            total_count += 1;
            if goal.is_done() {
                done_count += 1;
            }
        }
        Self::from_counts(total_count, done_count)
    }

    /// Builds stats from raw counts, clamping `done_count` to `total_count`.
    pub fn from_counts(total_count: usize, done_count: usize) -> Self {
        let done_count = done_count.min(total_count);
        Self {
            total_count,
            done_count,
            completion_rate: completion_rate(total_count, done_count),
        }
    }

    pub fn todo_count(&self) -> usize {
        self.total_count - self.done_count
    }
}

/// Rounded completion percentage, half away from zero.
pub fn completion_rate(total_count: usize, done_count: usize) -> u32 {
    if total_count == 0 {
        return 0;
    }
    // Integer form of round(done * 100 / total).
    ((done_count * 200 + total_count) / (total_count * 2)) as u32
}
