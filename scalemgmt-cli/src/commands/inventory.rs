//! Read-only command handlers
//!
//! Handles connection checks and listing of filesystems, filesets, quotas,
//! ACLs and remote jobs.

use anyhow::{Context, Result};
use colored::*;
use scalemgmt_client::ScaleClient;
use scalemgmt_core::domain::outcome::RemoteJobState;
use serde_json::Value;

/// Query the info endpoint
pub async fn connection_test(client: &ScaleClient) -> Result<()> {
    let info = client
        .info()
        .await
        .with_context(|| format!("Failed to reach {}", client.base_url()))?;

    println!("{}", format!("✓ Connected to {}", client.base_url()).green().bold());
    if let Some(version) = info.pointer("/info/serverVersion").and_then(Value::as_str) {
        println!("  Server version: {}", version.cyan());
    }
    if let Some(name) = info.pointer("/info/name").and_then(Value::as_str) {
        println!("  Name:           {}", name);
    }
    Ok(())
}

/// List all filesystems
pub async fn list_filesystems(client: &ScaleClient) -> Result<()> {
    let filesystems = client.filesystems().await?;

    if filesystems.is_empty() {
        println!("{}", "No filesystems found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} filesystem(s):", filesystems.len()).bold());
    for fs in filesystems {
        match fs.oid {
            Some(oid) => println!("  {} {} {}", "▸".cyan(), fs.name, format!("(oid {})", oid).dimmed()),
            None => println!("  {} {}", "▸".cyan(), fs.name),
        }
    }
    Ok(())
}

/// List the filesets of one filesystem
pub async fn list_filesets(client: &ScaleClient, filesystem: &str, all_fields: bool) -> Result<()> {
    let filesets = client.filesets(filesystem, all_fields).await?;

    if filesets.is_empty() {
        println!("{}", format!("No filesets found in {}.", filesystem).yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} fileset(s) in {}:", filesets.len(), filesystem).bold()
    );
    for fileset in filesets {
        println!("  {} {}", "▸".cyan(), fileset.fileset_name);
        if let Some(config) = &fileset.config {
            if let Some(path) = &config.path {
                println!("    Path:    {}", path.dimmed());
            }
            if let Some(comment) = config.comment.as_deref().filter(|c| !c.is_empty()) {
                println!("    Comment: {}", comment);
            }
        }
    }
    Ok(())
}

/// List quotas of a filesystem or fileset
pub async fn list_quotas(
    client: &ScaleClient,
    filesystem: &str,
    fileset: Option<&str>,
    filter: Option<&str>,
) -> Result<()> {
    let quotas = client.quotas(filesystem, fileset, filter).await?;
    let scope = match fileset {
        Some(fileset) => format!("{}/{}", filesystem, fileset),
        None => filesystem.to_string(),
    };

    if quotas.is_empty() {
        println!("{}", format!("No quotas found for {}.", scope).yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} quota(s) for {}:", quotas.len(), scope).bold());
    for quota in &quotas {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            quota.object_name.as_deref().unwrap_or("-"),
            quota.quota_type.as_deref().unwrap_or("").dimmed()
        );
        println!(
            "    Blocks: {} used, {} soft, {} hard (KiB)",
            count(quota.block_usage),
            count(quota.block_quota),
            count(quota.block_limit)
        );
        println!(
            "    Files:  {} used, {} soft, {} hard",
            count(quota.files_usage),
            count(quota.files_quota),
            count(quota.files_limit)
        );
    }
    Ok(())
}

/// Show the ACL of a path
pub async fn show_acl(client: &ScaleClient, filesystem: &str, path: &str) -> Result<()> {
    let acl = client.acl(filesystem, path).await?;

    println!(
        "{}",
        format!("ACL of {} ({}):", path, acl.kind.as_deref().unwrap_or("unknown type")).bold()
    );
    if acl.entries.is_empty() {
        println!("  {}", "No entries.".yellow());
    }
    for entry in &acl.entries {
        let kind = match entry.kind.as_str() {
            "deny" => entry.kind.red(),
            _ => entry.kind.green(),
        };
        let flags = if entry.flags.is_empty() {
            String::new()
        } else {
            format!("({})", entry.flags)
        };
        println!(
            "  {} {:<5} {:<24} {} {}",
            "▸".cyan(),
            kind,
            entry.who,
            entry.permissions,
            flags.dimmed()
        );
    }
    Ok(())
}

fn count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// List remote jobs, or show one in detail
pub async fn show_jobs(client: &ScaleClient, id: Option<&str>) -> Result<()> {
    match id {
        Some(id) => show_job(client, id).await,
        None => list_jobs(client).await,
    }
}

async fn list_jobs(client: &ScaleClient) -> Result<()> {
    let jobs = client.jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No remote jobs found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} remote job(s):", jobs.len()).bold());
    for job in &jobs {
        let id = match job.get("jobId") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "-".to_string(),
        };
        let state = job
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");

        println!("  {} Job {} {}", "▸".cyan(), id.dimmed(), colorize_state_str(state));
        if let Some(url) = job.pointer("/request/url").and_then(Value::as_str) {
            let method = job
                .pointer("/request/type")
                .and_then(Value::as_str)
                .unwrap_or("");
            println!("    Request: {} {}", method, url.dimmed());
        }
    }
    Ok(())
}

async fn show_job(client: &ScaleClient, id: &str) -> Result<()> {
    let status = client.job_status(id).await?;

    println!("{}", "Remote Job Details:".bold());
    println!("  ID:     {}", id.cyan());
    println!("  Status: {}", colorize_state(status.state));
    if let Some(detail) = &status.error_detail {
        println!("\n{}", "Error:".bold());
        println!("{}", detail.red());
    }

    println!("\n{}", "Response:".bold());
    println!("{}", serde_json::to_string_pretty(&status.raw)?);
    Ok(())
}

fn colorize_state(state: RemoteJobState) -> ColoredString {
    colorize_state_str(&format!("{:?}", state).to_uppercase())
}

fn colorize_state_str(state: &str) -> ColoredString {
    match state.to_ascii_uppercase().as_str() {
        "COMPLETED" => state.green(),
        "FAILED" => state.red(),
        "RUNNING" => state.cyan(),
        "CANCELLING" | "CANCELLED" => state.dimmed(),
        _ => state.yellow(),
    }
}
