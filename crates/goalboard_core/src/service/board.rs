//! Canonical goal collection with optimistic mutations.
//!
//! # Responsibility
//! - Own the goal collection and the per-goal pending-mutation registry.
//! - Apply status flips and creations locally, then reconcile them with the
//!   remote outcome carried by a ticket.
//!
//! # Invariants
//! - At most one pending mutation per goal id; a second toggle is rejected.
//! - `begin_*` mutates synchronously and before any remote call is issued.
//! - After `settle_*` the goal matches either its pre-mutation snapshot or
//!   the authoritative remote value, never the optimistic guess.
//! - Validation and guard failures leave the board untouched.
//! - A snapshot fetched before a settle never overrides that settle, and a
//!   snapshot older than the last applied one is discarded.
//! - Stats are recomputed from the collection on every read.

use crate::clock::{Clock, SystemClock};
use crate::model::goal::{Goal, GoalId, GoalStatus, NewGoal};
use crate::model::stats::DerivedStats;
use crate::projection::goal_list::{project_goal_list, GoalListQuery, GoalListView};
use crate::remote::{CreatedGoal, GoalListSnapshot, RemoteError, StatusUpdate};
use crate::service::error::BoardError;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// In-flight status change for one goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub goal_id: GoalId,
    /// Full goal state before the optimistic flip.
    pub previous_snapshot: Goal,
    pub desired_status: GoalStatus,
}

/// Proof of an applied optimistic toggle; settle it exactly once.
#[derive(Debug)]
#[must_use = "an unsettled toggle keeps the goal locked"]
pub struct ToggleTicket {
    goal_id: GoalId,
    remote_id: String,
    desired_status: GoalStatus,
    snapshot: Goal,
}

impl ToggleTicket {
    pub fn goal_id(&self) -> &GoalId {
        &self.goal_id
    }

    pub fn remote_id(&self) -> &str {
        self.remote_id.as_str()
    }

    pub fn desired_status(&self) -> GoalStatus {
        self.desired_status
    }

    /// Goal as optimistically applied; sent with the status update.
    pub fn snapshot(&self) -> &Goal {
        &self.snapshot
    }
}

/// Proof of an inserted provisional goal; settle it exactly once.
#[derive(Debug)]
#[must_use = "an unsettled create leaves a provisional goal on the board"]
pub struct CreateTicket {
    provisional_id: GoalId,
    draft: NewGoal,
}

impl CreateTicket {
    pub fn provisional_id(&self) -> &GoalId {
        &self.provisional_id
    }

    /// Validated create request.
    pub fn draft(&self) -> &NewGoal {
        &self.draft
    }
}

/// Marks the board revision a list fetch started at.
#[derive(Debug)]
#[must_use = "a refresh ticket applies nothing until settled with a snapshot"]
pub struct RefreshTicket {
    started_at: u64,
}

impl RefreshTicket {
    pub fn started_at(&self) -> u64 {
        self.started_at
    }
}

/// Goal collection for one space.
pub struct GoalBoard {
    space_id: String,
    goals: Vec<Goal>,
    pending: HashMap<GoalId, PendingMutation>,
    /// Revision at which each goal last settled; pruned by later snapshots.
    settled: HashMap<GoalId, u64>,
    /// Start revision of the newest applied snapshot.
    snapshot_revision: u64,
    revision: u64,
    clock: Box<dyn Clock>,
}

impl GoalBoard {
    pub fn new(space_id: impl Into<String>) -> Self {
        Self::with_clock(space_id, Box::new(SystemClock))
    }

    pub fn with_clock(space_id: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        Self {
            space_id: space_id.into(),
            goals: Vec::new(),
            pending: HashMap::new(),
            settled: HashMap::new(),
            snapshot_revision: 0,
            revision: 0,
            clock,
        }
    }

    pub fn space_id(&self) -> &str {
        self.space_id.as_str()
    }

    /// Canonical collection in board order (newest local inserts first).
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal(&self, id: &GoalId) -> Option<&Goal> {
        self.goals.iter().find(|goal| &goal.id == id)
    }

    pub fn stats(&self) -> DerivedStats {
        DerivedStats::from_goals(&self.goals)
    }

    pub fn view(&self, query: &GoalListQuery) -> GoalListView {
        project_goal_list(&self.goals, query)
    }

    pub fn pending(&self, id: &GoalId) -> Option<&PendingMutation> {
        self.pending.get(id)
    }

    pub fn is_pending(&self, id: &GoalId) -> bool {
        self.pending.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Change counter; bumps on every visible mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the collection with a snapshot fetched just now.
    pub fn load_snapshot(&mut self, snapshot: GoalListSnapshot) {
        let started_at = self.revision;
        self.apply_snapshot(snapshot, started_at);
    }

    /// Records the revision a list fetch starts from.
    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket {
            started_at: self.revision,
        }
    }

    /// Applies a snapshot fetched under `ticket`.
    ///
    /// Goals settled or pending since the fetch started keep their local
    /// state. Returns `false` when a newer snapshot was already applied and
    /// this one was discarded.
    pub fn settle_refresh(&mut self, ticket: RefreshTicket, snapshot: GoalListSnapshot) -> bool {
        self.apply_snapshot(snapshot, ticket.started_at)
    }

    fn apply_snapshot(&mut self, snapshot: GoalListSnapshot, started_at: u64) -> bool {
        if started_at < self.snapshot_revision {
            warn!(
                "event=board_load module=board status=stale_discarded started_at={} newest={}",
                started_at, self.snapshot_revision
            );
            return false;
        }

        let reported = (snapshot.total_count, snapshot.done_count);
        let keep_local = self
            .goals
            .iter()
            .filter(|goal| {
                self.pending.contains_key(&goal.id)
                    || self
                        .settled
                        .get(&goal.id)
                        .is_some_and(|settled_at| *settled_at > started_at)
            })
            .map(|goal| goal.id.clone())
            .collect::<HashSet<_>>();
        let mut provisional = self
            .goals
            .iter()
            .filter(|goal| goal.id.is_provisional())
            .cloned()
            .collect::<Vec<_>>();

        let mut listed = Vec::with_capacity(reported.0);
        let mut seen = HashSet::new();
        for remote_goal in snapshot.into_goals() {
            let local = self.goal(&remote_goal.id);
            if keep_local.contains(&remote_goal.id) {
                if let Some(local) = local {
                    seen.insert(local.id.clone());
                    listed.push(local.clone());
                    continue;
                }
            }
            if local.is_none() {
                // A create whose response is still in flight may already be
                // listed; show the server row instead of both.
                if let Some(index) = provisional
                    .iter()
                    .position(|draft| same_draft(draft, &remote_goal))
                {
                    let adopted = provisional.remove(index);
                    debug!(
                        "event=board_load module=board status=provisional_adopted provisional_id={} goal_id={}",
                        adopted.id, remote_goal.id
                    );
                }
            }
            seen.insert(remote_goal.id.clone());
            listed.push(remote_goal);
        }

        let carried = self
            .goals
            .iter()
            .filter(|goal| keep_local.contains(&goal.id) && !seen.contains(&goal.id))
            .filter(|goal| !goal.id.is_provisional())
            .cloned()
            .collect::<Vec<_>>();
        let carried_count = carried.len();

        let mut goals = provisional;
        goals.extend(carried);
        goals.extend(listed);
        self.goals = goals;
        self.settled.retain(|_, settled_at| *settled_at > started_at);
        self.snapshot_revision = started_at;
        self.revision += 1;

        let stats = self.stats();
        if reported != (stats.total_count, stats.done_count) {
            warn!(
                "event=board_load module=board status=count_mismatch reported_total={} reported_done={} total={} done={}",
                reported.0, reported.1, stats.total_count, stats.done_count
            );
        }
        info!(
            "event=board_load module=board status=ok total={} done={} pending={} carried={}",
            stats.total_count,
            stats.done_count,
            self.pending.len(),
            carried_count
        );
        true
    }

    /// Flips a goal's status locally and locks it until settled.
    ///
    /// # Errors
    /// - `ProvisionalGoal` when the goal has no remote identity yet.
    /// - `GoalNotFound` when the id is not on the board.
    /// - `MutationPending` when a toggle for this goal is in flight.
    pub fn begin_toggle(&mut self, id: &GoalId) -> Result<ToggleTicket, BoardError> {
        let Some(remote_id) = id.remote_id().map(str::to_string) else {
            return Err(reject(BoardError::ProvisionalGoal(id.clone())));
        };
        if self.pending.contains_key(id) {
            return Err(reject(BoardError::MutationPending(id.clone())));
        }
        let now_ms = self.clock.now_ms();
        let Some(goal) = self.goals.iter_mut().find(|goal| &goal.id == id) else {
            return Err(reject(BoardError::GoalNotFound(id.clone())));
        };

        let previous_snapshot = goal.clone();
        goal.status = goal.status.flipped();
        goal.updated_at_ms = now_ms;
        let desired_status = goal.status;
        let snapshot = goal.clone();

        self.pending.insert(
            id.clone(),
            PendingMutation {
                goal_id: id.clone(),
                previous_snapshot,
                desired_status,
            },
        );
        self.revision += 1;

        let stats = self.stats();
        info!(
            "event=goal_toggle module=board status=optimistic goal_id={} desired={} done={} rate={}",
            id,
            desired_status.as_str(),
            stats.done_count,
            stats.completion_rate
        );

        Ok(ToggleTicket {
            goal_id: id.clone(),
            remote_id,
            desired_status,
            snapshot,
        })
    }

    /// Reconciles a toggle with its remote outcome and unlocks the goal.
    ///
    /// On success the remote goal's fields win. On failure the full
    /// pre-toggle snapshot is restored and the error is returned.
    pub fn settle_toggle(
        &mut self,
        ticket: ToggleTicket,
        outcome: Result<StatusUpdate, RemoteError>,
    ) -> Result<Goal, BoardError> {
        let pending = self.pending.remove(&ticket.goal_id);
        self.revision += 1;
        self.settled.insert(ticket.goal_id.clone(), self.revision);

        match outcome {
            Ok(update) => {
                let Some(goal) = self.goals.iter_mut().find(|goal| goal.id == ticket.goal_id)
                else {
                    warn!(
                        "event=goal_toggle module=board status=ok_detached goal_id={}",
                        ticket.goal_id
                    );
                    return Ok(update.goal);
                };
                apply_authoritative(goal, &update.goal);
                let reconciled = goal.clone();
                info!(
                    "event=goal_toggle module=board status=ok goal_id={} status={}",
                    ticket.goal_id,
                    reconciled.status.as_str()
                );
                Ok(reconciled)
            }
            Err(err) => {
                if let Some(pending) = pending {
                    if let Some(goal) = self.goals.iter_mut().find(|goal| goal.id == ticket.goal_id)
                    {
                        *goal = pending.previous_snapshot;
                    }
                }
                let stats = self.stats();
                warn!(
                    "event=goal_toggle module=board status=rolled_back goal_id={} error_code={} done={} rate={}",
                    ticket.goal_id,
                    err.code(),
                    stats.done_count,
                    stats.completion_rate
                );
                Err(BoardError::Transport(err))
            }
        }
    }

    /// Validates `draft` and inserts a provisional goal at the front.
    ///
    /// # Errors
    /// - `Validation` when a required field is missing; nothing is inserted.
    pub fn begin_create(&mut self, draft: &NewGoal) -> Result<CreateTicket, BoardError> {
        let draft = draft
            .validate()
            .map_err(|err| reject(BoardError::Validation(err)))?;

        let goal = Goal::provisional(&draft, self.clock.now_ms());
        let provisional_id = goal.id.clone();
        self.goals.insert(0, goal);
        self.revision += 1;

        info!(
            "event=goal_create module=board status=optimistic goal_id={} total={}",
            provisional_id,
            self.goals.len()
        );
        Ok(CreateTicket {
            provisional_id,
            draft,
        })
    }

    /// Swaps the provisional goal for the confirmed one, or removes it.
    pub fn settle_create(
        &mut self,
        ticket: CreateTicket,
        outcome: Result<CreatedGoal, RemoteError>,
    ) -> Result<Goal, BoardError> {
        let outcome = outcome.and_then(confirmed_goal);
        let position = self
            .goals
            .iter()
            .position(|goal| goal.id == ticket.provisional_id);
        self.revision += 1;

        match outcome {
            Ok(goal) => {
                self.settled.insert(goal.id.clone(), self.revision);
                let already_listed = self.goals.iter().any(|existing| existing.id == goal.id);
                match position {
                    Some(index) if already_listed => {
                        self.goals.remove(index);
                    }
                    Some(index) => self.goals[index] = goal.clone(),
                    None if already_listed => {}
                    None => self.goals.insert(0, goal.clone()),
                }
                info!(
                    "event=goal_create module=board status=ok goal_id={} total={}",
                    goal.id,
                    self.goals.len()
                );
                Ok(goal)
            }
            Err(err) => {
                if let Some(index) = position {
                    self.goals.remove(index);
                }
                warn!(
                    "event=goal_create module=board status=rolled_back goal_id={} error_code={} total={}",
                    ticket.provisional_id,
                    err.code(),
                    self.goals.len()
                );
                Err(BoardError::Transport(err))
            }
        }
    }
}

fn reject(err: BoardError) -> BoardError {
    debug!(
        "event=board_reject module=board status=rejected error_code={}",
        err.code()
    );
    err
}

fn same_draft(provisional: &Goal, remote: &Goal) -> bool {
    provisional.title == remote.title
        && provisional.assignee == remote.assignee
        && provisional.due_on == remote.due_on
}

fn apply_authoritative(local: &mut Goal, remote: &Goal) {
    local.title = remote.title.clone();
    local.detail = remote.detail.clone();
    local.assignee = remote.assignee.clone();
    local.due_on = remote.due_on.clone();
    local.status = remote.status;
    local.updated_at_ms = remote.updated_at_ms;
}

fn confirmed_goal(created: CreatedGoal) -> Result<Goal, RemoteError> {
    let mut goal = created.goal;
    if let Some(task_id) = created
        .task_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        goal.id = GoalId::Confirmed(task_id);
    }
    if goal.id.is_provisional() {
        return Err(RemoteError::InvalidResponse(
            "created goal has no confirmed id".to_string(),
        ));
    }
    Ok(goal)
}

#[cfg(test)]
mod tests {
    use super::GoalBoard;
    use crate::clock::ManualClock;
    use crate::model::goal::{Goal, GoalId, GoalStatus, NewGoal};
    use crate::remote::{CreatedGoal, GoalListSnapshot, RemoteError, StatusUpdate};

    fn board_with(goals: Vec<Goal>) -> GoalBoard {
        let mut board = GoalBoard::with_clock("space-1", Box::new(ManualClock::starting_at(10)));
        let mut snapshot = GoalListSnapshot::empty("space-1");
        snapshot.total_count = goals.len();
        snapshot.todo_goals = goals;
        board.load_snapshot(snapshot);
        board
    }

    #[test]
    fn provisional_toggle_is_rejected_without_change() {
        let mut board = board_with(vec![Goal::new("g1", "A", 1)]);
        let ticket = board
            .begin_create(&NewGoal::new("B", "aki", "2024-01-01"))
            .unwrap();
        let revision = board.revision();

        let err = board.begin_toggle(ticket.provisional_id()).unwrap_err();
        assert!(matches!(err, super::BoardError::ProvisionalGoal(_)));
        assert_eq!(board.revision(), revision);
        assert_eq!(board.pending_count(), 0);
        let _ = board.settle_create(ticket, Err(RemoteError::Timeout));
    }

    #[test]
    fn load_keeps_optimistic_state_of_pending_goal() {
        let mut board = board_with(vec![Goal::new("g1", "A", 1)]);
        let id = GoalId::confirmed("g1");
        let ticket = board.begin_toggle(&id).unwrap();

        let mut snapshot = GoalListSnapshot::empty("space-1");
        snapshot.todo_goals = vec![Goal::new("g1", "A", 1), Goal::new("g2", "B", 2)];
        snapshot.total_count = 2;
        board.load_snapshot(snapshot);

        assert_eq!(board.goal(&id).unwrap().status, GoalStatus::Done);
        assert_eq!(board.stats().total_count, 2);
        assert!(board.is_pending(&id));
        let _ = board.settle_toggle(ticket, Err(RemoteError::Timeout));
        assert_eq!(board.goal(&id).unwrap().status, GoalStatus::Todo);
    }

    #[test]
    fn create_success_uses_task_id_and_keeps_position() {
        let mut board = board_with(vec![Goal::new("g1", "A", 1)]);
        let ticket = board
            .begin_create(&NewGoal::new("B", "aki", "2024-01-01"))
            .unwrap();
        assert!(board.goals()[0].id.is_provisional());

        let mut remote_goal = Goal::new("server-side", "B", 20);
        remote_goal.assignee = Some("aki".to_string());
        let created = board
            .settle_create(
                ticket,
                Ok(CreatedGoal {
                    goal: remote_goal,
                    task_id: Some("task-9".to_string()),
                }),
            )
            .unwrap();

        assert_eq!(created.id, GoalId::confirmed("task-9"));
        assert_eq!(board.goals()[0].id, GoalId::confirmed("task-9"));
        assert_eq!(board.stats().total_count, 2);
    }

    #[test]
    fn create_response_without_confirmed_id_rolls_back() {
        let mut board = board_with(Vec::new());
        let ticket = board
            .begin_create(&NewGoal::new("B", "aki", "2024-01-01"))
            .unwrap();
        let mut bogus = Goal::new("x", "B", 20);
        bogus.id = GoalId::provisional();

        let err = board
            .settle_create(
                ticket,
                Ok(CreatedGoal {
                    goal: bogus,
                    task_id: None,
                }),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            super::BoardError::Transport(RemoteError::InvalidResponse(_))
        ));
        assert!(board.goals().is_empty());
    }

    #[test]
    fn stale_snapshot_keeps_goals_settled_after_fetch_started() {
        let mut board = board_with(vec![Goal::new("g1", "A", 1)]);
        let id = GoalId::confirmed("g1");
        let refresh = board.begin_refresh();
        let stale = board_snapshot(&board);

        let toggle = board.begin_toggle(&id).unwrap();
        let mut confirmed = board.goal(&id).unwrap().clone();
        confirmed.updated_at_ms = 50;
        board
            .settle_toggle(
                toggle,
                Ok(StatusUpdate {
                    goal: confirmed,
                    message: "ok".to_string(),
                }),
            )
            .unwrap();
        let create = board
            .begin_create(&NewGoal::new("B", "aki", "2024-01-01"))
            .unwrap();
        let mut created = Goal::new("g2", "B", 60);
        created.assignee = Some("aki".to_string());
        created.due_on = Some("2024-01-01".to_string());
        board
            .settle_create(
                create,
                Ok(CreatedGoal {
                    goal: created,
                    task_id: None,
                }),
            )
            .unwrap();

        assert!(board.settle_refresh(refresh, stale));

        assert_eq!(board.goal(&id).unwrap().status, GoalStatus::Done);
        assert_eq!(board.goal(&id).unwrap().updated_at_ms, 50);
        assert!(board.goal(&GoalId::confirmed("g2")).is_some());
        assert_eq!(board.stats().total_count, 2);

        let fresh = board_snapshot(&board);
        board.load_snapshot(fresh);
        assert_eq!(board.stats().done_count, 1);
    }

    #[test]
    fn snapshot_older_than_applied_one_is_discarded() {
        let mut board = board_with(vec![Goal::new("g1", "A", 1)]);
        let older = board.begin_refresh();
        let toggle = board.begin_toggle(&GoalId::confirmed("g1")).unwrap();
        let _ = board.settle_toggle(toggle, Err(RemoteError::Timeout));
        let newer = board.begin_refresh();

        let mut current = GoalListSnapshot::empty("space-1");
        current.todo_goals = vec![Goal::new("g1", "A", 1), Goal::new("g3", "C", 3)];
        current.total_count = 2;
        assert!(board.settle_refresh(newer, current));
        let revision = board.revision();

        assert!(!board.settle_refresh(older, GoalListSnapshot::empty("space-1")));
        assert_eq!(board.revision(), revision);
        assert_eq!(board.stats().total_count, 2);
    }

    #[test]
    fn snapshot_listing_in_flight_create_replaces_provisional() {
        let mut board = board_with(vec![Goal::new("g1", "A", 1)]);
        let ticket = board
            .begin_create(&NewGoal::new("B", "aki", "2024-01-01"))
            .unwrap();

        let mut server_row = Goal::new("g2", "B", 20);
        server_row.assignee = Some("aki".to_string());
        server_row.due_on = Some("2024-01-01".to_string());
        let mut snapshot = GoalListSnapshot::empty("space-1");
        snapshot.todo_goals = vec![Goal::new("g1", "A", 1), server_row.clone()];
        snapshot.total_count = 2;
        board.load_snapshot(snapshot);

        assert_eq!(board.stats().total_count, 2);
        assert!(board.goals().iter().all(|goal| !goal.id.is_provisional()));

        let created = board
            .settle_create(
                ticket,
                Ok(CreatedGoal {
                    goal: server_row,
                    task_id: None,
                }),
            )
            .unwrap();
        assert_eq!(created.id, GoalId::confirmed("g2"));
        assert_eq!(board.stats().total_count, 2);
    }

    fn board_snapshot(board: &GoalBoard) -> GoalListSnapshot {
        let mut snapshot = GoalListSnapshot::empty("space-1");
        for goal in board.goals().iter().filter(|goal| !goal.id.is_provisional()) {
            snapshot.total_count += 1;
            match goal.status {
                GoalStatus::Done => {
                    snapshot.done_count += 1;
                    snapshot.done_goals.push(goal.clone());
                }
                GoalStatus::Todo => snapshot.todo_goals.push(goal.clone()),
            }
        }
        snapshot
    }
}
