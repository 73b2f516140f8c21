//! Scale Management Core
//!
//! Core types shared by the management API client, the job scheduler and
//! the `scalectl` front end.
//!
//! This crate contains:
//! - Domain types: prepared requests, locally tracked jobs, remote job state
//! - DTOs: queue responses, tick reports and aggregate status snapshots

pub mod domain;
pub mod dto;
