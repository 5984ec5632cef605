//! `roastbot` — deadline tracker that reminds before and roasts after.

pub mod clock;
pub mod commands;
pub mod config;
pub mod lifecycle;
pub mod notify;
pub mod reminder;
pub mod roast;
pub mod store;
pub mod sweeper;
