use goalboard_core::{
    BoardConfig, CreatedGoal, Goal, GoalId, GoalListSnapshot, GoalRemote, GoalSession, GoalStatus,
    NewGoal, RemoteError, RemoteResult, StatusUpdate,
};
use std::cell::{Cell, RefCell};
use tokio::sync::Notify;

/// In-memory goal service whose list fetch reads its rows, then waits for
/// `release()` before answering.
#[derive(Default)]
struct SlowListRemote {
    rows: RefCell<Vec<Goal>>,
    hold_fetch: Cell<bool>,
    gate: Notify,
    next_id: Cell<u32>,
}

impl SlowListRemote {
    fn with_rows(rows: Vec<Goal>) -> Self {
        let remote = Self::default();
        *remote.rows.borrow_mut() = rows;
        remote
    }

    fn release(&self) {
        self.gate.notify_one();
    }
}

impl GoalRemote for SlowListRemote {
    async fn fetch_goal_list(&self, space_id: &str) -> RemoteResult<GoalListSnapshot> {
        let mut snapshot = GoalListSnapshot::empty(space_id);
        for goal in self.rows.borrow().iter() {
            snapshot.total_count += 1;
            match goal.status {
                GoalStatus::Done => {
                    snapshot.done_count += 1;
                    snapshot.done_goals.push(goal.clone());
                }
                GoalStatus::Todo => snapshot.todo_goals.push(goal.clone()),
            }
        }
        if self.hold_fetch.get() {
            self.gate.notified().await;
        }
        Ok(snapshot)
    }

    async fn submit_goal_status(
        &self,
        goal_id: &str,
        status: GoalStatus,
        _snapshot: &Goal,
    ) -> RemoteResult<StatusUpdate> {
        let mut rows = self.rows.borrow_mut();
        let Some(row) = rows.iter_mut().find(|row| row.id.remote_id() == Some(goal_id)) else {
            return Err(RemoteError::not_found(format!("Goal with id {goal_id} not found.")));
        };
        row.status = status;
        row.updated_at_ms += 1;
        Ok(StatusUpdate {
            goal: row.clone(),
            message: "Goal updated successfully".to_string(),
        })
    }

    async fn submit_new_goal(&self, _space_id: &str, goal: &NewGoal) -> RemoteResult<CreatedGoal> {
        self.next_id.set(self.next_id.get() + 1);
        let task_id = format!("new-{}", self.next_id.get());
        let mut row = Goal::new(task_id.as_str(), goal.title.clone(), 5_000);
        row.assignee = Some(goal.assignee.clone());
        row.due_on = Some(goal.due_on.clone());
        self.rows.borrow_mut().push(row.clone());
        Ok(CreatedGoal {
            goal: row,
            task_id: Some(task_id),
        })
    }
}

async fn loaded_session(remote: SlowListRemote) -> GoalSession<SlowListRemote> {
    let session = GoalSession::new("space-1", remote, BoardConfig::default());
    session.refresh().await.unwrap();
    session
}

#[tokio::test]
async fn refresh_started_before_mutations_keeps_their_confirmed_results() {
    let remote = SlowListRemote::with_rows(vec![Goal::new("g1", "Plan", 1_000)]);
    let session = loaded_session(remote).await;
    session.remote().hold_fetch.set(true);
    let g1 = GoalId::confirmed("g1");
    let draft = NewGoal::new("Book room", "mika", "2024-01-20");

    let (refreshed, settled) = tokio::join!(session.refresh(), async {
        let toggled = session.request_toggle(&g1).await.unwrap();
        let created = session.request_create(&draft).await.unwrap();
        session.remote().release();
        (toggled, created)
    });

    let (toggled, created) = settled;
    let stats = refreshed.unwrap();
    assert_eq!(session.goal(&g1).unwrap(), toggled);
    assert_eq!(session.goal(&g1).unwrap().status, GoalStatus::Done);
    assert_eq!(session.goal(&created.id).unwrap(), created);
    assert_eq!(stats.total_count, 2);
    assert_eq!(stats.done_count, 1);
    assert_eq!(stats.completion_rate, 50);
}

#[tokio::test]
async fn next_refresh_after_interleaving_matches_server() {
    let remote = SlowListRemote::with_rows(vec![Goal::new("g1", "Plan", 1_000)]);
    let session = loaded_session(remote).await;
    session.remote().hold_fetch.set(true);
    let g1 = GoalId::confirmed("g1");

    let (stale, toggled) = tokio::join!(session.refresh(), async {
        let toggled = session.request_toggle(&g1).await;
        session.remote().release();
        toggled
    });
    stale.unwrap();
    toggled.unwrap();

    session.remote().hold_fetch.set(false);
    let stats = session.refresh().await.unwrap();

    let server_rows = session.remote().rows.borrow().clone();
    assert_eq!(session.goals(), server_rows);
    assert_eq!(stats.done_count, 1);
}
