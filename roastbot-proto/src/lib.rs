//! Shared data model for roastbot.
//!
//! Defines the task record, owner and task identifiers, list filters,
//! and the roast severity tiers with their fixed message sets.

pub mod roast;
pub mod task;
