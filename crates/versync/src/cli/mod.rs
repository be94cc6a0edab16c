//! CLI module for versync
//!
//! Every command loads the manifest named by `--manifest`, works on the
//! stores declared under `<namespace>.versioning.stores`, and reports either
//! as a table or, with `--json`, as a single JSON document on stdout.

pub mod error;
pub mod output;

pub mod apply;
pub mod check;
pub mod list;
pub mod schema;
pub mod sync;

use crate::cli::error::HelpfulError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use versync_stores::{
    BatchResult, BatchStatus, CancellationToken, DirectWriter, ProjectConfig, UpdateEngine, VersionSet,
    VersionString,
};

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub manifest: PathBuf,
    pub namespace: String,
    pub json: bool,
}

/// How a command ended, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Invalid configuration or a rolled-back batch.
    Failed,
    /// Some stores were written, some were not.
    Degraded,
}

impl CommandStatus {
    pub fn from_batch(result: &BatchResult) -> Self {
        match result.status {
            BatchStatus::Committed | BatchStatus::Planned => CommandStatus::Success,
            BatchStatus::RolledBack => CommandStatus::Failed,
            BatchStatus::Degraded => CommandStatus::Degraded,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            CommandStatus::Success => ExitCode::SUCCESS,
            CommandStatus::Failed => ExitCode::from(1),
            CommandStatus::Degraded => ExitCode::from(2),
        }
    }
}

/// Options shared by the commands that run a batch.
#[derive(Debug, Clone, clap::Args)]
pub struct BatchArgs {
    /// Compute every new file content without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite files in place instead of writing a temp file and renaming it
    #[arg(long)]
    pub direct_writes: bool,
}

/// Load and validate the manifest, turning config errors into helpful ones.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<ProjectConfig> {
    ProjectConfig::load(&global.manifest, &global.namespace)
        .map_err(|err| HelpfulError::from_config(err, &global.namespace).into())
}

/// Run one batch and print its result.
///
/// Ctrl-C before the commit phase cancels the batch; after that the writes
/// already being issued are finished.
pub fn run_batch(
    global: &GlobalArgs,
    version: &VersionString,
    stores: &VersionSet,
    args: &BatchArgs,
) -> anyhow::Result<CommandStatus> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, cancelling batch...");
        handler_token.cancel();
    }) {
        warn!("Failed to install Ctrl+C handler: {}", err);
    }

    let mut engine = UpdateEngine::new()
        .dry_run(args.dry_run)
        .with_cancellation(token);
    if args.direct_writes {
        engine = engine.with_writer(DirectWriter);
    }

    let result = engine.apply(version, stores);
    if global.json {
        output::print_json(&output::batch_json(&result))?;
    } else {
        output::print_batch(&result);
    }
    Ok(CommandStatus::from_batch(&result))
}
