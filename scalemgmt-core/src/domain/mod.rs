//! Core domain types
//!
//! These types describe the unit of work the scheduler tracks (a prepared
//! request wrapped in a job) and what the remote management system reports
//! back about it. They carry no I/O and are shared by the client, the
//! scheduler and the CLI.

pub mod job;
pub mod outcome;
pub mod request;
