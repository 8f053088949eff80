//! Goal session: board, remote and gesture handling for one space view.
//!
//! # Responsibility
//! - Drive `GoalBoard` tickets against a `GoalRemote` with a bounded wait.
//! - Route pointer contacts per goal through trackers and the feedback
//!   projector, turning swipe commits into toggles.
//! - Keep the latest user-facing notice.
//!
//! # Invariants
//! - Runs on a single-threaded executor; no `RefCell` borrow is held across
//!   an `.await`.
//! - The optimistic part of a mutation is applied before the remote future
//!   is first polled.
//! - Every started remote call settles its ticket exactly once.

use crate::config::BoardConfig;
use crate::gesture::feedback::{SwipeFeedbackProjector, VisualState};
use crate::gesture::tracker::{GestureEvent, GestureTracker, Point, SwipeDirection};
use crate::gesture::CommitPolicy;
use crate::model::goal::{Goal, GoalId, NewGoal};
use crate::model::stats::DerivedStats;
use crate::projection::goal_list::{GoalListQuery, GoalListView};
use crate::remote::{GoalListSnapshot, GoalRemote, RemoteError, RemoteResult, TransportFailure};
use crate::service::board::GoalBoard;
use crate::service::error::{BoardError, Notice};
use log::{debug, warn};
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::future::Future;

/// Feedback for one accepted pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactFeedback {
    pub visual: VisualState,
    /// Host should cancel default scrolling for this move.
    pub suppress_scroll: bool,
}

/// One space view bound to a remote service.
pub struct GoalSession<R: GoalRemote> {
    board: RefCell<GoalBoard>,
    remote: R,
    config: BoardConfig,
    trackers: RefCell<HashMap<GoalId, GestureTracker>>,
    feedback: RefCell<SwipeFeedbackProjector>,
    notice: RefCell<Option<Notice>>,
}

impl<R: GoalRemote> GoalSession<R> {
    pub fn new(space_id: impl Into<String>, remote: R, config: BoardConfig) -> Self {
        Self::with_board(GoalBoard::new(space_id), remote, config)
    }

    pub fn with_board(board: GoalBoard, remote: R, config: BoardConfig) -> Self {
        Self {
            board: RefCell::new(board),
            remote,
            feedback: RefCell::new(SwipeFeedbackProjector::new(config.feedback)),
            config,
            trackers: RefCell::new(HashMap::new()),
            notice: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Read access to the board; drop the guard before awaiting.
    pub fn board(&self) -> Ref<'_, GoalBoard> {
        self.board.borrow()
    }

    pub fn goals(&self) -> Vec<Goal> {
        self.board.borrow().goals().to_vec()
    }

    pub fn goal(&self, id: &GoalId) -> Option<Goal> {
        self.board.borrow().goal(id).cloned()
    }

    pub fn stats(&self) -> DerivedStats {
        self.board.borrow().stats()
    }

    pub fn view(&self, query: &GoalListQuery) -> GoalListView {
        self.board.borrow().view(query)
    }

    pub fn revision(&self) -> u64 {
        self.board.borrow().revision()
    }

    pub fn visual_state(&self, id: &GoalId) -> VisualState {
        self.feedback.borrow().current(id)
    }

    /// Latest notice, left in place.
    pub fn notice(&self) -> Option<Notice> {
        self.notice.borrow().clone()
    }

    /// Latest notice, cleared on read.
    pub fn take_notice(&self) -> Option<Notice> {
        self.notice.borrow_mut().take()
    }

    /// Reloads the space from the remote service.
    ///
    /// A 404 for the space list means the space has no goals yet. Mutations
    /// that settle while the fetch is in flight keep their local result.
    pub async fn refresh(&self) -> Result<DerivedStats, BoardError> {
        let (space_id, ticket) = {
            let board = self.board.borrow();
            (board.space_id().to_string(), board.begin_refresh())
        };
        let fetched = self
            .bounded("fetch_goal_list", self.remote.fetch_goal_list(&space_id))
            .await;

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) if err.classify() == TransportFailure::NotFound => {
                debug!("event=board_refresh module=session status=empty_space");
                GoalListSnapshot::empty(space_id)
            }
            Err(err) => return Err(self.surface(BoardError::Transport(err))),
        };

        let mut board = self.board.borrow_mut();
        board.settle_refresh(ticket, snapshot);
        Ok(board.stats())
    }

    /// Flips a goal optimistically and reconciles with the remote result.
    pub async fn request_toggle(&self, id: &GoalId) -> Result<Goal, BoardError> {
        let ticket = self
            .board
            .borrow_mut()
            .begin_toggle(id)
            .map_err(|err| self.surface(err))?;

        let outcome = self
            .bounded(
                "submit_goal_status",
                self.remote.submit_goal_status(
                    ticket.remote_id(),
                    ticket.desired_status(),
                    ticket.snapshot(),
                ),
            )
            .await;

        self.board
            .borrow_mut()
            .settle_toggle(ticket, outcome)
            .map_err(|err| self.surface(err))
    }

    /// Inserts a provisional goal and replaces it with the created one.
    pub async fn request_create(&self, draft: &NewGoal) -> Result<Goal, BoardError> {
        let (ticket, space_id) = {
            let mut board = self.board.borrow_mut();
            let ticket = board.begin_create(draft).map_err(|err| self.surface(err))?;
            (ticket, board.space_id().to_string())
        };

        let outcome = self
            .bounded(
                "submit_new_goal",
                self.remote.submit_new_goal(&space_id, ticket.draft()),
            )
            .await;

        self.board
            .borrow_mut()
            .settle_create(ticket, outcome)
            .map_err(|err| self.surface(err))
    }

    /// Opens a gesture on `id`'s row.
    pub fn handle_contact_start(&self, id: &GoalId, point: Point) {
        self.trackers
            .borrow_mut()
            .entry(id.clone())
            .or_insert_with(|| GestureTracker::new(self.config.gesture))
            .on_contact_start(point);
    }

    /// Feeds a move; `None` when ignored (no contact or scroll intent).
    pub fn handle_contact_move(&self, id: &GoalId, point: Point) -> Option<ContactFeedback> {
        let event = self
            .trackers
            .borrow_mut()
            .get_mut(id)?
            .on_contact_move(point)?;

        match event {
            GestureEvent::Progress {
                progress,
                direction,
                suppress_scroll,
            } => Some(ContactFeedback {
                visual: self.feedback.borrow_mut().update(id, progress, direction),
                suppress_scroll,
            }),
            GestureEvent::Commit(_) | GestureEvent::Reset => None,
        }
    }

    /// Closes a gesture; a valid commit toggles the goal.
    ///
    /// Returns `Ok(None)` when nothing was committed or the commit direction
    /// does not apply to the goal's current status.
    pub async fn handle_contact_end(&self, id: &GoalId) -> Result<Option<Goal>, BoardError> {
        let events = match self.trackers.borrow_mut().remove(id) {
            Some(mut tracker) => tracker.on_contact_end(),
            None => Vec::new(),
        };
        let commit = self.apply_events(id, &events);

        let Some(direction) = commit else {
            return Ok(None);
        };
        let Some(status) = self.board.borrow().goal(id).map(|goal| goal.status) else {
            return Err(self.surface(BoardError::GoalNotFound(id.clone())));
        };
        if CommitPolicy::resolve(direction, status).is_none() {
            debug!(
                "event=swipe_commit module=session status=discarded goal_id={} direction={:?}",
                id, direction
            );
            return Ok(None);
        }

        self.request_toggle(id).await.map(Some)
    }

    /// Aborts a gesture without committing.
    pub fn handle_contact_cancel(&self, id: &GoalId) {
        let events = match self.trackers.borrow_mut().remove(id) {
            Some(mut tracker) => tracker.on_contact_cancel(),
            None => Vec::new(),
        };
        self.apply_events(id, &events);
    }

    fn apply_events(&self, id: &GoalId, events: &[GestureEvent]) -> Option<SwipeDirection> {
        let mut commit = None;
        for event in events {
            match event {
                GestureEvent::Commit(direction) => commit = Some(*direction),
                GestureEvent::Reset => {
                    self.feedback.borrow_mut().reset(id);
                }
                GestureEvent::Progress { .. } => {}
            }
        }
        commit
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = RemoteResult<T>>,
    ) -> RemoteResult<T> {
        match tokio::time::timeout(self.config.remote_timeout(), call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "event=remote_call module=session status=timeout operation={} timeout_ms={}",
                    operation, self.config.remote_timeout_ms
                );
                Err(RemoteError::Timeout)
            }
        }
    }

    fn surface(&self, err: BoardError) -> BoardError {
        *self.notice.borrow_mut() = Some(Notice::from(&err));
        err
    }
}
