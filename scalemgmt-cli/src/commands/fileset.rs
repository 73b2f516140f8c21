//! Fileset provisioning
//!
//! Creates a fileset, then sets its quota and replaces its ACL. The quota
//! is only applied if the fileset was created; the ACL is attempted either
//! way, since the path may already exist.

use anyhow::Result;
use clap::Args;
use colored::*;
use scalemgmt_client::ScaleClient;
use scalemgmt_client::models::{AclEntry, NewFileset, QuotaLimits};
use scalemgmt_core::domain::job::JobStatus;
use scalemgmt_core::domain::request::PreparedRequest;
use scalemgmt_core::dto::queue::{AggregateLabel, QueueStatus, TickReport};
use scalemgmt_scheduler::{HttpRemoteJobClient, Scheduler};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;

/// Arguments of `create-fileset`
#[derive(Debug, Clone, Args)]
pub struct CreateFilesetArgs {
    /// Filesystem to create the fileset in
    #[arg(long)]
    pub filesystem: String,

    /// Name of the new fileset
    #[arg(long)]
    pub fileset: String,

    /// Junction path of the fileset
    #[arg(long)]
    pub path: String,

    /// Inode space of the fileset ("new" for an independent fileset)
    #[arg(long, default_value = "new")]
    pub parent: String,

    #[arg(long)]
    pub comment: Option<String>,

    #[arg(long, default_value = "root")]
    pub owner: String,

    #[arg(long, default_value = "root")]
    pub group: String,

    /// Octal permissions of the junction
    #[arg(long, default_value = "0750")]
    pub permissions: String,

    /// Group granted read access in the ACL
    #[arg(long, default_value = "apps-team")]
    pub acl_group: String,

    #[arg(long, default_value = "10G")]
    pub block_soft_limit: String,

    #[arg(long, default_value = "11G")]
    pub block_hard_limit: String,

    #[arg(long, default_value = "7days")]
    pub block_grace_period: String,

    #[arg(long, default_value = "10M")]
    pub files_soft_limit: String,

    #[arg(long, default_value = "11M")]
    pub files_hard_limit: String,

    #[arg(long, default_value = "7days")]
    pub files_grace_period: String,
}

/// The three prepared requests of the workflow
struct Workflow {
    fileset: PreparedRequest,
    quota: PreparedRequest,
    acl: PreparedRequest,
}

impl Workflow {
    fn prepare(client: &ScaleClient, args: &CreateFilesetArgs) -> Result<Self> {
        let mut fileset = NewFileset::new(&args.filesystem, &args.fileset, &args.path);
        fileset.owner = args.owner.clone();
        fileset.group = args.group.clone();
        fileset.permissions = args.permissions.clone();
        fileset.inode_space = args.parent.clone();
        fileset.comment = args.comment.clone();

        let limits = QuotaLimits::fileset(&args.filesystem, &args.fileset)
            .blocks(
                &args.block_soft_limit,
                &args.block_hard_limit,
                &args.block_grace_period,
            )
            .files(
                &args.files_soft_limit,
                &args.files_hard_limit,
                &args.files_grace_period,
            );

        Ok(Self {
            fileset: client.create_fileset_request(&fileset),
            quota: client.set_quota_request(&limits),
            acl: client.put_acl_request(&args.filesystem, &args.path, &acl_entries(&args.acl_group))?,
        })
    }

    /// Queue the requests, returning labelled job ids in queue order
    fn queue(self, scheduler: &mut Scheduler) -> Result<Vec<(Uuid, &'static str)>> {
        let fileset = scheduler.queue(self.fileset)?.uuid;
        let quota = scheduler.queue_job(self.quota, Some(fileset), false)?.uuid;
        let acl = scheduler.queue_job(self.acl, Some(fileset), true)?.uuid;

        Ok(vec![(fileset, "fileset"), (quota, "quota"), (acl, "acl")])
    }
}

/// Owner, group, reader group and everyone, each once for the directory
/// itself and once inherited by new files and directories
fn acl_entries(reader_group: &str) -> Vec<AclEntry> {
    let reader = format!("group:{}", reader_group);
    ["", "fdi"]
        .into_iter()
        .flat_map(|flags| {
            [
                AclEntry::allow("special:owner@", "rwmxDaAnNcCos", flags),
                AclEntry::allow("special:group@", "rwmxDancs", flags),
                AclEntry::allow(&reader, "rxancs", flags),
                AclEntry::allow("special:everyone@", "ancs", flags),
            ]
        })
        .collect()
}

/// Run the create-fileset workflow
pub async fn create_fileset(client: ScaleClient, config: &Config, args: CreateFilesetArgs) -> Result<()> {
    let workflow = Workflow::prepare(&client, &args)?;
    let remote = Arc::new(HttpRemoteJobClient::new(client, config.dry_run));
    let mut scheduler = Scheduler::with_config(remote, config.scheduler_config());

    let labels = workflow.queue(&mut scheduler)?;

    if config.dry_run {
        println!("{}", "Dry run: no changes will be made".yellow().bold());
    }
    println!(
        "{}",
        format!("Queued {} job(s) for fileset {}:", labels.len(), args.fileset).bold()
    );
    for (id, label) in &labels {
        if let Some(job) = scheduler.job(*id) {
            println!("  {} {:<8} {} {}", "▸".cyan(), label, job.request, id.to_string().dimmed());
        }
    }
    println!();

    let history = match scheduler.run_logged().await {
        Ok(history) => history,
        Err(e) => {
            print_status(&scheduler.status(), &labels);
            return Err(e.into());
        }
    };

    for report in &history {
        print_tick(report, &labels);
    }
    if config.dry_run {
        print_simulated(&scheduler, &labels);
    }

    let status = scheduler.status();
    print_status(&status, &labels);

    if status.fail_count > 0 {
        anyhow::bail!("{} of {} job(s) failed", status.fail_count, status.job_count);
    }
    Ok(())
}

fn label_of<'a>(labels: &'a [(Uuid, &'static str)], id: Uuid) -> &'a str {
    labels
        .iter()
        .find(|(job_id, _)| *job_id == id)
        .map(|(_, label)| *label)
        .unwrap_or("job")
}

/// Print one tick's job states
fn print_tick(report: &TickReport, labels: &[(Uuid, &'static str)]) {
    println!("{}", format!("Tick {}", report.tick).bold());
    for state in &report.jobs {
        let mut line = format!(
            "  {} {:<8} {}",
            "▸".cyan(),
            label_of(labels, state.id),
            colorize_status(&state.status)
        );
        if let Some(remote) = &state.remote_job_id {
            line.push_str(&format!(" {}", format!("(remote job {})", remote).dimmed()));
        }
        if state.new_submission {
            line.push_str(&format!(" {}", "submitted".green()));
        }
        println!("{}", line);
    }
}

/// Print the requests that a live run would have sent
fn print_simulated(scheduler: &Scheduler, labels: &[(Uuid, &'static str)]) {
    for job in scheduler.list_jobs().iter().filter(|job| job.simulated) {
        let Some(snapshot) = scheduler.snapshot(job.id) else {
            continue;
        };
        println!("\n{}", format!("Simulated {}:", label_of(labels, job.id)).bold());
        match serde_json::to_string_pretty(&snapshot.request) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", job.request),
        }
    }
}

/// Print the aggregate status and any failures
fn print_status(status: &QueueStatus, labels: &[(Uuid, &'static str)]) {
    let label = status.label.to_string();
    let label = match status.label {
        AggregateLabel::Completed if status.fail_count == 0 => label.green(),
        AggregateLabel::Completed => label.red(),
        AggregateLabel::Running => label.cyan(),
        AggregateLabel::Pending | AggregateLabel::Empty => label.yellow(),
    };

    println!();
    println!("{} {}", "Queue:".bold(), label);
    println!(
        "  {} job(s): {} waiting, {} running, {} finished, {} failed",
        status.job_count,
        status.new_count,
        status.running_count,
        status.complete_count,
        status.fail_count
    );
    for (id, message) in &status.fail_reports {
        println!("  {} {}: {}", "✗".red(), label_of(labels, *id), message.red());
    }
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        JobStatus::New | JobStatus::Pending => status_str.yellow(),
        JobStatus::Submitted | JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::SubmitFailed | JobStatus::RequiredFailed | JobStatus::Failed => status_str.red(),
    }
}
