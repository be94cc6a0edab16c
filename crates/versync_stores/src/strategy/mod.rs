//! Format strategies
//!
//! One strategy per store kind. A strategy turns the current content of a
//! store plus the new version into the new content; it never writes. The
//! engine owns every write so a whole batch can be checked before the first
//! file changes.

mod module_export;
mod structured;
mod text_pattern;

pub use module_export::ModuleExportStrategy;
pub use structured::{JsonDialect, StructuredFieldStrategy};
pub use text_pattern::TextPatternStrategy;

use crate::error::{Result, StoreError};
use crate::path::StorePath;
use crate::schema::{StoreDeclaration, StoreKind};
use crate::version::VersionString;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Content of a store as read at the start of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentState {
    pub content: String,
    /// SHA-256 of `content`, hex encoded.
    pub hash: String,
}

impl CurrentState {
    pub fn new(content: String) -> Self {
        let hash = content_hash(&content);
        Self { content, hash }
    }
}

pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Read/transform contract shared by every store kind.
pub trait FormatStrategy: fmt::Debug + Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Short description of what the strategy rewrites (for listings).
    fn describe(&self) -> String;

    fn read(&self, absolute: &Path, store: &StorePath) -> Result<CurrentState> {
        std::fs::read_to_string(absolute)
            .map(CurrentState::new)
            .map_err(|err| StoreError::io(store.as_str(), err))
    }

    /// Compute the new content. Pure: no I/O, no side effects.
    fn apply(&self, store: &StorePath, current: &str, version: &VersionString) -> Result<String>;
}

/// Bind a declaration to the strategy for its kind.
pub fn strategy_for(decl: &StoreDeclaration) -> Box<dyn FormatStrategy> {
    match decl {
        StoreDeclaration::StructuredField { path, field } => Box::new(StructuredFieldStrategy::new(
            field.clone().unwrap_or_default(),
            JsonDialect::from_path(path),
        )),
        StoreDeclaration::ModuleExport {
            style, export_name, ..
        } => Box::new(ModuleExportStrategy::new(*style, export_name.clone())),
        StoreDeclaration::TextPattern { replace, .. } => Box::new(TextPatternStrategy::new(replace.clone())),
    }
}
