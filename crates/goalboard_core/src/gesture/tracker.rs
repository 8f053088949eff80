//! Swipe recognition over raw pointer samples.
//!
//! # Responsibility
//! - Turn contact start/move/end samples into continuous progress events.
//! - Emit at most one discrete commit per contact.
//!
//! # Invariants
//! - At most one `GestureSession` exists per tracker.
//! - Scroll-intent moves leave the session untouched and emit nothing.
//! - `progress` stays in `[0, 1]`; `distance` is never negative.
//! - `Reset` is the last event of every closed session.

use crate::config::GestureConfig;
use serde::{Deserialize, Serialize};

/// Pointer position in host coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Horizontal swipe direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
    #[default]
    None,
}

/// Events emitted by the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Accepted move with current progress.
    ///
    /// `suppress_scroll` asks the host to cancel its default scroll handling.
    Progress {
        progress: f64,
        direction: SwipeDirection,
        suppress_scroll: bool,
    },
    /// Release past the commit threshold.
    Commit(SwipeDirection),
    /// Session closed; visuals should return to neutral.
    Reset,
}

/// State of one active contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSession {
    pub origin: Point,
    pub current: Point,
    pub direction: SwipeDirection,
    pub distance: f64,
    pub progress: f64,
    pub committable: bool,
}

impl GestureSession {
    fn anchored_at(point: Point) -> Self {
        Self {
            origin: point,
            current: point,
            direction: SwipeDirection::None,
            distance: 0.0,
            progress: 0.0,
            committable: false,
        }
    }
}

/// Single-contact swipe state machine.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    config: GestureConfig,
    session: Option<GestureSession>,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Returns the active session, if a contact is down.
    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a session anchored at `point`.
    ///
    /// A session left open by a lost end event is replaced.
    pub fn on_contact_start(&mut self, point: Point) {
        self.session = Some(GestureSession::anchored_at(point));
    }

    /// Feeds one move sample.
    ///
    /// Returns `None` when no contact is down or the move reads as vertical
    /// scrolling.
    pub fn on_contact_move(&mut self, point: Point) -> Option<GestureEvent> {
        let config = self.config;
        let session = self.session.as_mut()?;

        let delta_x = point.x - session.origin.x;
        let delta_y = (point.y - session.origin.y).abs();
        if delta_y > config.scroll_tolerance && delta_x.abs() < delta_y {
            return None;
        }

        session.current = point;
        session.distance = delta_x.abs();
        session.progress = (session.distance / config.max_distance).min(1.0);

        let activated = delta_x.abs() > config.activation_threshold;
        if activated {
            session.direction = if delta_x > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
            session.committable = session.distance > config.commit_threshold;
        }

        Some(GestureEvent::Progress {
            progress: session.progress,
            direction: session.direction,
            suppress_scroll: activated,
        })
    }

    /// Closes the session, committing when the threshold was passed.
    pub fn on_contact_end(&mut self) -> Vec<GestureEvent> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };

        let mut events = Vec::with_capacity(2);
        if session.committable
            && session.distance > self.config.commit_threshold
            && session.direction != SwipeDirection::None
        {
            events.push(GestureEvent::Commit(session.direction));
        }
        events.push(GestureEvent::Reset);
        events
    }

    /// Closes the session without committing.
    pub fn on_contact_cancel(&mut self) -> Vec<GestureEvent> {
        match self.session.take() {
            Some(_) => vec![GestureEvent::Reset],
            None => Vec::new(),
        }
    }
}
