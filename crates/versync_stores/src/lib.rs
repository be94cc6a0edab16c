//! Version Stores
//!
//! # Philosophy: One Version, Many Copies
//!
//! A project's manifest holds the version. Everything else that repeats it
//! (a `version.ts` module, a nested JSON field, a README badge) is a
//! *version store* declared next to it:
//!
//! 1. **Declare**: stores are listed under `versync.versioning.stores`
//! 2. **Validate**: every declaration is checked before anything is read
//! 3. **Resolve**: declarations become descriptors bound to a format strategy
//! 4. **Apply**: all stores are staged in memory, then written together
//!
//! A batch either reaches every store or none of them. If the commit
//! itself fails halfway, the result says exactly which files were written.
//!
//! # Modules
//!
//! - [`schema`]: Declaration shapes, validation, JSON Schema export
//! - [`resolver`]: Declarations to strategy-bound descriptors
//! - [`strategy`]: Structured-field, module-export and text-pattern formats
//! - [`engine`]: Transactional batch updates
//! - [`config`]: Loading declarations from the project manifest

pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod path;
pub mod resolver;
pub mod schema;
pub mod strategy;
pub mod version;
pub mod writer;

pub use cancel::CancellationToken;
pub use config::{ConfigError, ProjectConfig, DEFAULT_MANIFEST, DEFAULT_NAMESPACE};
pub use error::{Result, StoreError};
pub use path::StorePath;
pub use resolver::{resolve, StoreDescriptor, VersionSet};
pub use schema::{
    config_json_schema, json_schema, validate, FieldLocator, ModuleStyle, StoreDeclaration, StoreDeclarations, StoreKind,
    TextReplace, ValidationError, ValidationErrors, VERSION_TOKEN,
};
pub use version::{InvalidVersion, VersionString};
pub use writer::{AtomicRenameWriter, DirectWriter, StoreWriter};

// Re-export key types from engine module
pub use engine::{
    apply_version, was_written, BatchResult, BatchStatus, Phase, StoreChange, StoreOutcome, StoreReport,
    UpdateEngine,
};
