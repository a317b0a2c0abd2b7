use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use roster_config::{RosterConfig, DEFAULT_CONFIG_FILE};
use roster_runtime::{EditScope, RecurrencePattern, RosterApp, ShiftDraft, ShiftPatch};

#[derive(Debug, Parser)]
#[command(name = "roster", about = "Recurring shift scheduling CLI")]
pub struct Cli {
    /// Config file; defaults to ./configs/roster.yaml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging unless RUST_LOG is set
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a standalone shift or a recurring series
    Add(AddArgs),
    /// Update a shift, one occurrence or the whole series
    Update(UpdateArgs),
    /// Delete a shift, one occurrence or the whole series
    Delete(DeleteArgs),
    /// Shifts overlapping a date range, completed with their series
    Range(RangeArgs),
    /// Shifts assigned to one assignee
    Assignee(AssigneeArgs),
    /// Every stored shift
    List,
    /// Detach orphaned series members
    Repair,
}

#[derive(Debug, Args, Clone)]
struct AddArgs {
    #[arg(long)]
    assignee: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    start: NaiveDate,
    /// Last day of a multi-day shift; defaults to the start day
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Vacation or blackout time
    #[arg(long)]
    blocking: bool,
    #[arg(long, default_value = "")]
    notes: String,
    /// daily, weekly, biweekly or monthly
    #[arg(long, requires = "until")]
    pattern: Option<RecurrencePattern>,
    /// Recurrence end date, inclusive
    #[arg(long, requires = "pattern")]
    until: Option<NaiveDate>,
}

#[derive(Debug, Args, Clone)]
struct UpdateArgs {
    id: String,
    /// this, span or series
    #[arg(long)]
    scope: EditScope,
    #[arg(long)]
    assignee: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    #[arg(long)]
    blocking: Option<bool>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    pattern: Option<RecurrencePattern>,
    #[arg(long)]
    until: Option<NaiveDate>,
}

#[derive(Debug, Args, Clone)]
struct DeleteArgs {
    id: String,
    #[arg(long)]
    scope: EditScope,
}

#[derive(Debug, Args, Clone)]
struct RangeArgs {
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
}

#[derive(Debug, Args, Clone)]
struct AssigneeArgs {
    id: String,
}

impl AddArgs {
    fn into_draft(self) -> ShiftDraft {
        let mut draft = ShiftDraft::new(self.assignee, self.location, self.start)
            .ending(self.end.unwrap_or(self.start))
            .with_notes(self.notes)
            .blocking(self.blocking);
        if let (Some(pattern), Some(until)) = (self.pattern, self.until) {
            draft = draft.recurring(pattern, until);
        }
        draft
    }
}

impl UpdateArgs {
    fn patch(&self) -> ShiftPatch {
        ShiftPatch {
            assignee_id: self.assignee.clone(),
            location_id: self.location.clone(),
            start_date: self.start,
            end_date: self.end,
            is_blocking_time: self.blocking,
            notes: self.notes.clone(),
            recurrence_pattern: self.pattern,
            recurrence_end_date: self.until,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        ensure_log_filter(self.verbose);
        let app = build_app(self.config.as_deref()).await?;
        let engine = &app.engine;

        match self.command {
            Command::Add(args) => print_json(&engine.add_shift(args.into_draft()).await?),
            Command::Update(args) => {
                let patch = args.patch();
                print_json(&engine.update_shift(&args.id, patch, args.scope).await?)
            }
            Command::Delete(args) => {
                print_json(&engine.delete_shift(&args.id, args.scope).await?)
            }
            Command::Range(args) => {
                print_json(&engine.get_shifts_by_date_range(args.from, args.to).await?)
            }
            Command::Assignee(args) => {
                print_json(&engine.get_shifts_by_assignee(&args.id).await?)
            }
            Command::List => print_json(&engine.get_all_shifts().await?),
            Command::Repair => print_json(&engine.repair().await?),
        }
    }
}

async fn build_app(config: Option<&Path>) -> anyhow::Result<RosterApp> {
    if let Some(path) = config {
        return RosterApp::from_config_path(path)
            .await
            .with_context(|| format!("failed to start from config '{}'", path.display()));
    }
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return RosterApp::from_config_path(default_path)
            .await
            .with_context(|| format!("failed to start from config '{}'", DEFAULT_CONFIG_FILE));
    }
    Ok(RosterApp::from_config(RosterConfig::default()).await?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ensure_log_filter(verbose: bool) {
    if !verbose {
        return;
    }
    if env::var("RUST_LOG").is_ok() {
        return;
    }
    env::set_var("RUST_LOG", "debug");
}
