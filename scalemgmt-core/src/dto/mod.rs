//! Data Transfer Objects
//!
//! Read-only views the scheduler hands to its callers: job snapshots, the
//! answer to a registration, the per-job state after a tick, and the
//! aggregate status of the whole queue. All of them serialize to JSON for
//! the CLI.

pub mod job;
pub mod queue;
