//! Update Engine
//!
//! Applies one version to every store of a [`VersionSet`]:
//!
//! ```text
//! Pending -> Reading -> Applying -> Committing -> Committed
//!               |           |            |
//!               +-----------+------------+--> RolledBack (no write happened)
//!                                        +--> Degraded   (some writes failed)
//! ```
//!
//! Reads and transforms have no side effects, so any failure before
//! `Committing` leaves every file untouched. Writes are issued only once
//! every strategy has produced its new content. Files are independent: a
//! failed write does not undo the writes that already succeeded.
//!
//! Several stores may name the same file. They are applied in declaration
//! order on top of each other and the file is written once.

use crate::cancel::CancellationToken;
use crate::error::StoreError;
use crate::path::StorePath;
use crate::resolver::{StoreDescriptor, VersionSet};
use crate::schema::StoreKind;
use crate::strategy::{content_hash, CurrentState};
use crate::version::VersionString;
use crate::writer::{AtomicRenameWriter, StoreWriter};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Phases of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Reading,
    Applying,
    Committing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Reading => "reading",
            Phase::Applying => "applying",
            Phase::Committing => "committing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every store was written.
    Committed,
    /// Dry run: every store was transformed, nothing was written.
    Planned,
    /// A read or transform failed, or the run was cancelled. Nothing was written.
    RolledBack,
    /// Some writes failed after others succeeded.
    Degraded,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Committed => "committed",
            BatchStatus::Planned => "planned",
            BatchStatus::RolledBack => "rolled_back",
            BatchStatus::Degraded => "degraded",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// New content computed for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// SHA-256 of the content the strategy started from.
    pub old_hash: String,
    pub new_content: String,
    pub changed: bool,
}

/// What happened to one store.
#[derive(Debug)]
pub enum StoreOutcome {
    Committed(StoreChange),
    Planned(StoreChange),
    Failed { phase: Phase, error: StoreError },
    NotAttempted,
}

impl StoreOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOutcome::Committed(_) => "committed",
            StoreOutcome::Planned(_) => "planned",
            StoreOutcome::Failed { .. } => "failed",
            StoreOutcome::NotAttempted => "not_attempted",
        }
    }

    pub fn change(&self) -> Option<&StoreChange> {
        match self {
            StoreOutcome::Committed(change) | StoreOutcome::Planned(change) => Some(change),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            StoreOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Outcome of one descriptor, in declaration order.
#[derive(Debug)]
pub struct StoreReport {
    pub path: StorePath,
    pub absolute_path: PathBuf,
    pub kind: StoreKind,
    pub outcome: StoreOutcome,
}

/// Aggregated result of a batch.
#[derive(Debug)]
pub struct BatchResult {
    pub version: VersionString,
    pub status: BatchStatus,
    pub cancelled: bool,
    pub stores: Vec<StoreReport>,
}

impl BatchResult {
    pub fn is_committed(&self) -> bool {
        self.status == BatchStatus::Committed
    }

    pub fn failures(&self) -> impl Iterator<Item = &StoreReport> {
        self.stores
            .iter()
            .filter(|report| matches!(report.outcome, StoreOutcome::Failed { .. }))
    }

    pub fn committed(&self) -> impl Iterator<Item = &StoreReport> {
        self.stores
            .iter()
            .filter(|report| matches!(report.outcome, StoreOutcome::Committed(_)))
    }
}

/// Content of one distinct file while a batch is in flight.
#[derive(Debug)]
struct StagedFile {
    absolute_path: PathBuf,
    original: CurrentState,
    content: String,
}

/// Runs batches against the filesystem.
#[derive(Debug)]
pub struct UpdateEngine {
    writer: Box<dyn StoreWriter>,
    dry_run: bool,
    cancel: CancellationToken,
}

impl Default for UpdateEngine {
    fn default() -> Self {
        Self {
            writer: Box::new(AtomicRenameWriter),
            dry_run: false,
            cancel: CancellationToken::new(),
        }
    }
}

impl UpdateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the commit-phase write backend.
    pub fn with_writer(mut self, writer: impl StoreWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    /// Stop after `Applying` and report what would be written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn apply(&self, version: &VersionString, stores: &VersionSet) -> BatchResult {
        let descriptors: Vec<&StoreDescriptor> = stores.iter().collect();
        let mut outcomes: Vec<StoreOutcome> = descriptors.iter().map(|_| StoreOutcome::NotAttempted).collect();
        info!(version = %version, stores = descriptors.len(), dry_run = self.dry_run, "Applying version to stores");

        // Reading
        let mut staged: Vec<StagedFile> = Vec::new();
        let mut slots: HashMap<PathBuf, usize> = HashMap::new();
        for (idx, desc) in descriptors.iter().enumerate() {
            if slots.contains_key(desc.absolute_path()) {
                continue;
            }
            match desc.strategy().read(desc.absolute_path(), desc.store_path()) {
                Ok(state) => {
                    debug!(path = %desc.store_path(), hash = %state.hash, "Read store");
                    slots.insert(desc.absolute_path().to_path_buf(), staged.len());
                    staged.push(StagedFile {
                        absolute_path: desc.absolute_path().to_path_buf(),
                        content: state.content.clone(),
                        original: state,
                    });
                }
                Err(error) => {
                    warn!(path = %desc.store_path(), error = %error, "Failed to read store; rolling back");
                    outcomes[idx] = StoreOutcome::Failed {
                        phase: Phase::Reading,
                        error,
                    };
                    return finish(version, BatchStatus::RolledBack, false, &descriptors, outcomes);
                }
            }
        }

        // Applying
        let mut changes: Vec<Option<StoreChange>> = descriptors.iter().map(|_| None).collect();
        let mut apply_failed = false;
        for (idx, desc) in descriptors.iter().enumerate() {
            let Some(&slot) = slots.get(desc.absolute_path()) else {
                continue;
            };
            let file = &mut staged[slot];
            match desc.strategy().apply(desc.store_path(), &file.content, version) {
                Ok(new_content) => {
                    let change = StoreChange {
                        old_hash: content_hash(&file.content),
                        changed: new_content != file.content,
                        new_content: new_content.clone(),
                    };
                    debug!(path = %desc.store_path(), kind = %desc.kind(), changed = change.changed, "Transformed store");
                    file.content = new_content;
                    changes[idx] = Some(change);
                }
                Err(error) => {
                    warn!(path = %desc.store_path(), error = %error, "Store transform failed");
                    outcomes[idx] = StoreOutcome::Failed {
                        phase: Phase::Applying,
                        error,
                    };
                    apply_failed = true;
                }
            }
        }

        if apply_failed {
            info!("Transform failures; no store was written");
            return finish(version, BatchStatus::RolledBack, false, &descriptors, outcomes);
        }

        if self.dry_run {
            for (outcome, change) in outcomes.iter_mut().zip(changes) {
                if let Some(change) = change {
                    *outcome = StoreOutcome::Planned(change);
                }
            }
            return finish(version, BatchStatus::Planned, false, &descriptors, outcomes);
        }

        if self.cancel.is_cancelled() {
            info!("Batch cancelled before commit; no store was written");
            return finish(version, BatchStatus::RolledBack, true, &descriptors, outcomes);
        }

        // Committing: every file is attempted regardless of earlier failures.
        let mut write_errors: HashMap<usize, io::Error> = HashMap::new();
        for (slot, file) in staged.iter().enumerate() {
            if file.content == file.original.content {
                debug!(path = %file.absolute_path.display(), "Store unchanged; skipping write");
                continue;
            }
            if let Err(err) = self.writer.write(&file.absolute_path, &file.content) {
                warn!(path = %file.absolute_path.display(), error = %err, "Failed to write store");
                write_errors.insert(slot, err);
            }
        }

        for (idx, desc) in descriptors.iter().enumerate() {
            let slot = slots.get(desc.absolute_path()).copied();
            outcomes[idx] = match (slot.and_then(|s| write_errors.get(&s)), changes[idx].take()) {
                (Some(err), _) => StoreOutcome::Failed {
                    phase: Phase::Committing,
                    error: StoreError::io(desc.store_path().as_str(), clone_io_error(err)),
                },
                (None, Some(change)) => StoreOutcome::Committed(change),
                (None, None) => StoreOutcome::NotAttempted,
            };
        }

        let status = if write_errors.is_empty() {
            BatchStatus::Committed
        } else {
            BatchStatus::Degraded
        };
        finish(version, status, false, &descriptors, outcomes)
    }
}

/// Apply `version` to `stores` with the default engine.
pub fn apply_version(version: &VersionString, stores: &VersionSet) -> BatchResult {
    UpdateEngine::default().apply(version, stores)
}

fn clone_io_error(err: &io::Error) -> io::Error {
    io::Error::new(err.kind(), err.to_string())
}

fn finish(
    version: &VersionString,
    status: BatchStatus,
    cancelled: bool,
    descriptors: &[&StoreDescriptor],
    outcomes: Vec<StoreOutcome>,
) -> BatchResult {
    let stores: Vec<StoreReport> = descriptors
        .iter()
        .zip(outcomes)
        .map(|(desc, outcome)| StoreReport {
            path: desc.store_path().clone(),
            absolute_path: desc.absolute_path().to_path_buf(),
            kind: desc.kind(),
            outcome,
        })
        .collect();

    let failed = stores
        .iter()
        .filter(|r| matches!(r.outcome, StoreOutcome::Failed { .. }))
        .count();
    info!(version = %version, status = %status, failed, "Batch finished");

    BatchResult {
        version: version.clone(),
        status,
        cancelled,
        stores,
    }
}

/// Whether `path` is one of the files a result reports as written.
pub fn was_written(result: &BatchResult, path: &Path) -> bool {
    result
        .committed()
        .any(|report| report.absolute_path == path && report.outcome.change().map_or(false, |c| c.changed))
}
