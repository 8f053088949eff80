//! Optimistic mutation services.
//!
//! # Responsibility
//! - `board`: synchronous reconciliation core over the goal collection.
//! - `session`: async driver binding a board to a remote and to gestures.
//! - `error`: shared error taxonomy and user-facing notices.

pub mod board;
pub mod error;
pub mod session;
