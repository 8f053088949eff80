//! Read-side projections over the canonical goal collection.

pub mod goal_list;
