//! Dependency-aware job scheduler for the Scale management API
//!
//! Callers stage prepared write requests, optionally ordering them after
//! another job, and drive the scheduler tick by tick (or with
//! [`Scheduler::run`]) until every job is terminal.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use scalemgmt_client::{ConnectionSettings, ScaleClient};
//! use scalemgmt_client::models::{NewFileset, QuotaLimits};
//! use scalemgmt_scheduler::{HttpRemoteJobClient, Scheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScaleClient::new(&ConnectionSettings::new("scale.example.org", "admin"))?;
//!     let fileset = client.create_fileset_request(&NewFileset::new("gpfs0", "apps", "/gpfs0/apps"));
//!     let quota = client.set_quota_request(&QuotaLimits::fileset("gpfs0", "apps").blocks("10G", "11G", "7days"));
//!
//!     let mut scheduler = Scheduler::new(Arc::new(HttpRemoteJobClient::new(client, false)));
//!     let created = scheduler.queue(fileset)?.uuid;
//!     scheduler.queue_job(quota, Some(created), false)?;
//!
//!     scheduler.run().await?;
//!     println!("{}", scheduler.status().label);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod remote;
pub mod scheduler;

pub use error::{Result, SchedulerError};
pub use remote::{HttpRemoteJobClient, RemoteJobClient};
pub use scheduler::{JobTable, Scheduler, SchedulerConfig};
