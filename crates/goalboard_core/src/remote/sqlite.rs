//! In-process goal service on SQLite.
//!
//! # Responsibility
//! - Answer `GoalRemote` calls from a local database, for the CLI and tests.
//! - Mirror the hosted service's status codes for missing goals.
//!
//! # Invariants
//! - Unknown goal ids fail with status 404.
//! - Listing a space without goals returns an empty snapshot.
//! - Rows are ordered by insertion (`order_index`) within a space.

use crate::clock::{Clock, SystemClock};
use crate::model::goal::{Goal, GoalId, GoalStatus, NewGoal};
use crate::model::stats::DerivedStats;
use crate::remote::{
    CreatedGoal, GoalListSnapshot, GoalRemote, RemoteError, RemoteResult, StatusUpdate,
};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const GOAL_SELECT_SQL: &str = "SELECT
    goal_id,
    title,
    detail,
    assignee,
    due_on,
    status,
    created_at,
    updated_at
FROM goals";

const STATUS_UPDATED_MESSAGE: &str = "Goal updated successfully";

/// SQLite-backed `GoalRemote`.
pub struct SqliteGoalRemote<'conn> {
    conn: &'conn Connection,
    clock: Box<dyn Clock>,
}

impl<'conn> SqliteGoalRemote<'conn> {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_clock(conn, Box::new(SystemClock))
    }

    pub fn with_clock(conn: &'conn Connection, clock: Box<dyn Clock>) -> Self {
        Self { conn, clock }
    }

    /// Inserts a validated goal at the end of `space_id`.
    pub fn insert_goal(&self, space_id: &str, draft: &NewGoal) -> RemoteResult<Goal> {
        let draft = draft
            .validate()
            .map_err(|err| RemoteError::Status {
                code: 422,
                message: err.to_string(),
            })?;
        let space_id = space_id.trim();
        if space_id.is_empty() {
            return Err(RemoteError::Status {
                code: 422,
                message: "space_id is required".to_string(),
            });
        }

        let goal_id = Uuid::new_v4().to_string();
        let now_ms = self.clock.now_ms();
        self.conn
            .execute(
                "INSERT INTO goals (
                    goal_id,
                    space_id,
                    title,
                    detail,
                    assignee,
                    due_on,
                    status,
                    order_index,
                    created_at,
                    updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                    (SELECT COALESCE(MAX(order_index) + 1, 0) FROM goals WHERE space_id = ?2),
                    ?8, ?8
                );",
                params![
                    goal_id,
                    space_id,
                    draft.title,
                    draft.detail,
                    draft.assignee,
                    draft.due_on,
                    GoalStatus::Todo.as_str(),
                    now_ms,
                ],
            )
            .map_err(storage_error)?;

        debug!("event=local_goal_insert module=remote status=ok");
        self.get_goal(goal_id.as_str())?
            .ok_or_else(|| RemoteError::server("inserted goal vanished"))
    }

    /// Sets `status` and bumps `updated_at`.
    pub fn update_status(&self, goal_id: &str, status: GoalStatus) -> RemoteResult<Goal> {
        let changed = self
            .conn
            .execute(
                "UPDATE goals SET status = ?1, updated_at = ?2 WHERE goal_id = ?3;",
                params![status.as_str(), self.clock.now_ms(), goal_id],
            )
            .map_err(storage_error)?;
        if changed == 0 {
            return Err(goal_not_found(goal_id));
        }

        self.get_goal(goal_id)?
            .ok_or_else(|| goal_not_found(goal_id))
    }

    pub fn get_goal(&self, goal_id: &str) -> RemoteResult<Option<Goal>> {
        let sql = format!("{GOAL_SELECT_SQL} WHERE goal_id = ?1;");
        self.conn
            .query_row(sql.as_str(), [goal_id], parse_goal_row)
            .optional()
            .map_err(storage_error)?
            .transpose()
    }

    /// Lists one space, split by status.
    pub fn list_space(&self, space_id: &str) -> RemoteResult<GoalListSnapshot> {
        let sql = format!("{GOAL_SELECT_SQL} WHERE space_id = ?1 ORDER BY order_index ASC;");
        let mut stmt = self.conn.prepare(sql.as_str()).map_err(storage_error)?;
        let rows = stmt
            .query_map([space_id], parse_goal_row)
            .map_err(storage_error)?;

        let mut snapshot = GoalListSnapshot::empty(space_id);
        for row in rows {
            let goal = row.map_err(storage_error)??;
            match goal.status {
                GoalStatus::Done => snapshot.done_goals.push(goal),
                GoalStatus::Todo => snapshot.todo_goals.push(goal),
            }
        }

        let stats = DerivedStats::from_counts(
            snapshot.done_goals.len() + snapshot.todo_goals.len(),
            snapshot.done_goals.len(),
        );
        snapshot.total_count = stats.total_count;
        snapshot.done_count = stats.done_count;
        snapshot.completion_rate = stats.completion_rate;
        Ok(snapshot)
    }
}

impl GoalRemote for SqliteGoalRemote<'_> {
    async fn fetch_goal_list(&self, space_id: &str) -> RemoteResult<GoalListSnapshot> {
        self.list_space(space_id)
    }

    async fn submit_goal_status(
        &self,
        goal_id: &str,
        status: GoalStatus,
        snapshot: &Goal,
    ) -> RemoteResult<StatusUpdate> {
        if snapshot.id.remote_id() != Some(goal_id) {
            warn!("event=local_goal_update module=remote status=rejected reason=snapshot_id_mismatch");
            return Err(RemoteError::Status {
                code: 400,
                message: "snapshot does not match goal id".to_string(),
            });
        }

        let goal = self.update_status(goal_id, status)?;
        Ok(StatusUpdate {
            goal,
            message: STATUS_UPDATED_MESSAGE.to_string(),
        })
    }

    async fn submit_new_goal(&self, space_id: &str, goal: &NewGoal) -> RemoteResult<CreatedGoal> {
        let goal = self.insert_goal(space_id, goal)?;
        let task_id = goal.id.remote_id().map(str::to_string);
        Ok(CreatedGoal { goal, task_id })
    }
}

fn parse_goal_row(row: &Row<'_>) -> rusqlite::Result<RemoteResult<Goal>> {
    let goal_id: String = row.get(0)?;
    let status_raw: String = row.get(5)?;
    let Some(status) = GoalStatus::parse(status_raw.as_str()) else {
        return Ok(Err(RemoteError::InvalidResponse(format!(
            "unknown goal status `{status_raw}`"
        ))));
    };

    Ok(Ok(Goal {
        id: GoalId::Confirmed(goal_id),
        title: row.get(1)?,
        detail: row.get(2)?,
        assignee: row.get(3)?,
        due_on: row.get(4)?,
        status,
        created_at_ms: row.get(6)?,
        updated_at_ms: row.get(7)?,
    }))
}

fn goal_not_found(goal_id: &str) -> RemoteError {
    RemoteError::not_found(format!("Goal with id {goal_id} not found."))
}

fn storage_error(err: rusqlite::Error) -> RemoteError {
    RemoteError::server(format!("storage failure: {err}"))
}

#[cfg(test)]
mod tests {
    use super::SqliteGoalRemote;
    use crate::clock::ManualClock;
    use crate::db::open_db_in_memory;
    use crate::model::goal::{GoalStatus, NewGoal};
    use crate::remote::TransportFailure;

    #[test]
    fn list_space_splits_by_status_and_counts() {
        let conn = open_db_in_memory().unwrap();
        let remote = SqliteGoalRemote::new(&conn);
        let first = remote
            .insert_goal("space-1", &NewGoal::new("One", "aki", "2024-01-01"))
            .unwrap();
        remote
            .insert_goal("space-1", &NewGoal::new("Two", "aki", "2024-01-02"))
            .unwrap();
        remote
            .insert_goal("space-2", &NewGoal::new("Other", "ren", "2024-01-03"))
            .unwrap();

        let id = first.id.remote_id().unwrap().to_string();
        remote.update_status(&id, GoalStatus::Done).unwrap();

        let snapshot = remote.list_space("space-1").unwrap();
        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.done_count, 1);
        assert_eq!(snapshot.completion_rate, 50);
        assert_eq!(snapshot.done_goals[0].title, "One");
        assert_eq!(snapshot.todo_goals[0].title, "Two");
    }

    #[test]
    fn update_status_stamps_clock_and_reports_missing_goal() {
        let conn = open_db_in_memory().unwrap();
        let clock = ManualClock::starting_at(1_000);
        let remote = SqliteGoalRemote::with_clock(&conn, Box::new(clock.clone()));
        let goal = remote
            .insert_goal("space-1", &NewGoal::new("One", "aki", "2024-01-01"))
            .unwrap();

        clock.advance(500);
        let updated = remote
            .update_status(goal.id.remote_id().unwrap(), GoalStatus::Done)
            .unwrap();
        assert_eq!(updated.created_at_ms, 1_000);
        assert_eq!(updated.updated_at_ms, 1_500);

        let err = remote.update_status("missing", GoalStatus::Done).unwrap_err();
        assert_eq!(err.classify(), TransportFailure::NotFound);
    }

    #[test]
    fn unknown_space_lists_empty() {
        let conn = open_db_in_memory().unwrap();
        let snapshot = SqliteGoalRemote::new(&conn).list_space("nowhere").unwrap();
        assert_eq!(snapshot.total_count, 0);
        assert_eq!(snapshot.completion_rate, 0);
        assert!(snapshot.into_goals().is_empty());
    }
}
