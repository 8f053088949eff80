//! Filtered, sorted goal list with aggregates.
//!
//! # Responsibility
//! - Derive the visible goal subset from the canonical collection.
//!
//! # Invariants
//! - Projection is a pure function of `(goals, query)`.
//! - `stats` always describe the full collection, not the visible subset.
//! - Sorting is stable; under `DueDate`, a pair with a missing date keeps
//!   input order.

use crate::model::goal::{Goal, GoalStatus};
use crate::model::stats::DerivedStats;
use feruca::Collator;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Status filter for the goal list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    fn accepts(self, status: GoalStatus) -> bool {
        match self {
            Self::All => true,
            Self::Completed => status == GoalStatus::Done,
            Self::Pending => status == GoalStatus::Todo,
        }
    }
}

/// Sort order for the goal list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first.
    #[default]
    CreatedAt,
    /// Earliest due date first.
    DueDate,
    /// Unicode collation order (CLDR root).
    Title,
}

/// Filter and sort criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalListQuery {
    /// Exact assignee match; `None` or blank disables the filter.
    pub assignee: Option<String>,
    pub status: StatusFilter,
    pub sort: SortKey,
}

/// Projected list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalListView {
    pub goals: Vec<Goal>,
    pub stats: DerivedStats,
}

impl GoalListView {
    pub fn visible_count(&self) -> usize {
        self.goals.len()
    }
}

/// Projects `goals` through `query`.
pub fn project_goal_list(goals: &[Goal], query: &GoalListQuery) -> GoalListView {
    let assignee = query
        .assignee
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let mut visible = goals
        .iter()
        .filter(|goal| match assignee {
            Some(wanted) => goal.assignee.as_deref() == Some(wanted),
            None => true,
        })
        .filter(|goal| query.status.accepts(goal.status))
        .cloned()
        .collect::<Vec<_>>();

    match query.sort {
        SortKey::CreatedAt => {
            visible.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        }
        SortKey::Title => {
            let mut collator = Collator::default();
            visible.sort_by(|a, b| compare_titles(&mut collator, a, b));
        }
        SortKey::DueDate => stable_pairwise_sort(&mut visible, compare_due_dates),
    }

    GoalListView {
        goals: visible,
        stats: DerivedStats::from_goals(goals),
    }
}

/// Collated title order; byte order breaks collation ties.
fn compare_titles(collator: &mut Collator, a: &Goal, b: &Goal) -> Ordering {
    collator
        .collate(a.title.as_str(), b.title.as_str())
        .then_with(|| a.title.cmp(&b.title))
}

/// Orders by due date; `Equal` when either side has no usable date.
fn compare_due_dates(a: &Goal, b: &Goal) -> Ordering {
    match (a.due_date(), b.due_date()) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => Ordering::Equal,
    }
}

/// Insertion sort that only swaps neighbours comparing `Greater`.
///
/// `compare_due_dates` is not a total order, so `slice::sort_by` is not
/// allowed here.
fn stable_pairwise_sort<T>(items: &mut [T], compare: impl Fn(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
