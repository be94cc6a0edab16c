//! Config Integration
//!
//! Version stores are declared inside the project manifest, under a
//! namespace reserved for this tool:
//!
//! ```json
//! {
//!   "name": "my-project",
//!   "version": "1.4.0",
//!   "versync": {
//!     "versioning": {
//!       "stores": [
//!         { "path": "src/version.ts" },
//!         { "path": "README.md", "match": "v\\d+\\.\\d+\\.\\d+", "replacement": "v{{version}}" }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! The namespace object itself may hold other keys; `versioning` accepts
//! only `stores`.

use crate::path::StorePath;
use crate::resolver::{resolve, StoreDescriptor, VersionSet};
use crate::schema::{describe, validate_at, FieldLocator, StoreDeclaration, StoreDeclarations, ValidationError, ValidationErrors};
use crate::version::{InvalidVersion, VersionString};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_NAMESPACE: &str = "versync";
pub const DEFAULT_MANIFEST: &str = "package.json";

const VERSIONING_KEYS: &[&str] = &["stores"];

/// Error type for manifest loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest {path} has no \"version\" field")]
    MissingVersion { path: String },

    #[error("Manifest {path} has an invalid version: {source}")]
    InvalidVersion {
        path: String,
        #[source]
        source: InvalidVersion,
    },

    #[error("Invalid version store configuration in {path}: {errors}")]
    Invalid { path: String, errors: ValidationErrors },
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Store configuration of one project, validated at load time.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    manifest_path: PathBuf,
    root: PathBuf,
    namespace: String,
    version: Option<String>,
    stores: StoreDeclarations,
}

impl ProjectConfig {
    /// Read and validate the manifest at `manifest_path`.
    pub fn load(manifest_path: &Path, namespace: &str) -> Result<Self> {
        let display = manifest_path.display().to_string();
        let content = std::fs::read_to_string(manifest_path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        let manifest: Value = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: display.clone(),
            source,
        })?;
        Self::from_manifest(&manifest, manifest_path, namespace)
    }

    /// Validate an already parsed manifest located at `manifest_path`.
    pub fn from_manifest(manifest: &Value, manifest_path: &Path, namespace: &str) -> Result<Self> {
        let root = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stores = extract_stores(manifest, namespace).map_err(|errors| ConfigError::Invalid {
            path: manifest_path.display().to_string(),
            errors,
        })?;
        debug!(manifest = %manifest_path.display(), stores = stores.len(), "Loaded store configuration");

        Ok(Self {
            manifest_path: manifest_path.to_path_buf(),
            root,
            namespace: namespace.to_string(),
            version: manifest
                .get("version")
                .and_then(Value::as_str)
                .map(str::to_string),
            stores,
        })
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory every store path is relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn declarations(&self) -> &StoreDeclarations {
        &self.stores
    }

    /// The manifest's own version: the source of truth.
    pub fn manifest_version(&self) -> Result<VersionString> {
        let path = self.manifest_path.display().to_string();
        let raw = self
            .version
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVersion { path: path.clone() })?;
        VersionString::parse(raw).map_err(|source| ConfigError::InvalidVersion { path, source })
    }

    /// Descriptors for every declared store, in declaration order.
    pub fn version_set(&self) -> VersionSet {
        resolve(self.stores.clone(), &self.root)
    }

    /// Structured store for the manifest's own `version` field.
    pub fn manifest_store(&self) -> Option<StoreDescriptor> {
        let file_name = self.manifest_path.file_name()?.to_str()?;
        let path = StorePath::parse(file_name).ok()?;
        let decl = StoreDeclaration::structured(path, Some(FieldLocator::default()));
        Some(StoreDescriptor::new(decl, &self.root))
    }
}

/// Pull `<namespace>.versioning.stores` out of a manifest and validate it.
///
/// A missing namespace, `versioning` object or `stores` field means no stores.
pub fn extract_stores(manifest: &Value, namespace: &str) -> std::result::Result<StoreDeclarations, ValidationErrors> {
    let ns_pointer = format!("/{}", namespace.replace('~', "~0").replace('/', "~1"));
    let invalid = |instance_path: String, expected: &str, actual: &Value| {
        ValidationErrors(vec![ValidationError {
            instance_path,
            expected: expected.to_string(),
            actual: describe(actual),
        }])
    };

    if !manifest.is_object() {
        return Err(invalid(String::new(), "a manifest object", manifest));
    }
    let ns = match manifest.get(namespace) {
        None => return Ok(StoreDeclarations::Many(Vec::new())),
        Some(ns) => ns,
    };
    let ns_obj = ns
        .as_object()
        .ok_or_else(|| invalid(ns_pointer.clone(), "an object", ns))?;

    let versioning_pointer = format!("{}/versioning", ns_pointer);
    let versioning = match ns_obj.get("versioning") {
        None => return Ok(StoreDeclarations::Many(Vec::new())),
        Some(v) => v,
    };
    let versioning_obj = versioning
        .as_object()
        .ok_or_else(|| invalid(versioning_pointer.clone(), "an object", versioning))?;

    let mut errors: Vec<ValidationError> = versioning_obj
        .iter()
        .filter(|(key, _)| !VERSIONING_KEYS.contains(&key.as_str()))
        .map(|(key, value)| ValidationError {
            instance_path: format!("{}/{}", versioning_pointer, key),
            expected: "no such field (unknown fields are rejected)".to_string(),
            actual: describe(value),
        })
        .collect();

    let stores = match versioning_obj.get("stores") {
        None => StoreDeclarations::Many(Vec::new()),
        Some(stores) => match validate_at(stores, &format!("{}/stores", versioning_pointer)) {
            Ok(decls) => decls,
            Err(ValidationErrors(mut errs)) => {
                errors.append(&mut errs);
                StoreDeclarations::Many(Vec::new())
            }
        },
    };

    if errors.is_empty() {
        Ok(stores)
    } else {
        Err(ValidationErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StoreKind;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_namespace_means_no_stores() {
        let decls = extract_stores(&json!({"name": "x", "version": "1.0.0"}), DEFAULT_NAMESPACE).unwrap();
        assert!(decls.is_empty());
        let decls = extract_stores(&json!({"versync": {"other": 1}}), DEFAULT_NAMESPACE).unwrap();
        assert!(decls.is_empty());
    }

    #[test]
    fn single_declaration_and_array_forms() {
        let one = json!({"versync": {"versioning": {"stores": {"path": "VERSION"}}}});
        assert_eq!(extract_stores(&one, DEFAULT_NAMESPACE).unwrap().len(), 1);

        let many = json!({"versync": {"versioning": {"stores": [{"path": "a.json"}, {"path": "b.ts"}]}}});
        assert_eq!(extract_stores(&many, DEFAULT_NAMESPACE).unwrap().len(), 2);
    }

    #[test]
    fn errors_carry_manifest_paths() {
        let manifest = json!({
            "versync": {
                "versioning": {
                    "store": [],
                    "stores": [{"path": "ok.json"}, {"kind": "module", "path": "x.txt"}]
                }
            }
        });
        let errs = extract_stores(&manifest, DEFAULT_NAMESPACE).unwrap_err();
        let paths: Vec<&str> = errs.iter().map(|e| e.instance_path.as_str()).collect();
        assert_eq!(paths, vec!["/versync/versioning/store", "/versync/versioning/stores/1/path"]);
    }

    #[test]
    fn custom_namespace() {
        let manifest = json!({"bscotch": {"versioning": {"stores": {"path": "VERSION"}}}});
        assert_eq!(extract_stores(&manifest, "bscotch").unwrap().len(), 1);
        assert!(extract_stores(&manifest, DEFAULT_NAMESPACE).unwrap().is_empty());
    }

    #[test]
    fn non_object_namespace_is_rejected() {
        let errs = extract_stores(&json!({"versync": true}), DEFAULT_NAMESPACE).unwrap_err();
        assert_eq!(errs.0[0].instance_path, "/versync");
    }

    #[test]
    fn load_from_disk() {
        let temp = TempDir::new().unwrap();
        let manifest_path = temp.path().join("package.json");
        std::fs::write(
            &manifest_path,
            r#"{"version": "1.2.3", "versync": {"versioning": {"stores": [{"path": "src/v.ts"}]}}}"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&manifest_path, DEFAULT_NAMESPACE).unwrap();
        assert_eq!(config.root(), temp.path());
        assert_eq!(config.manifest_version().unwrap().as_str(), "1.2.3");

        let set = config.version_set();
        assert_eq!(set.len(), 1);
        let desc = set.iter().next().unwrap();
        assert_eq!(desc.kind(), StoreKind::ModuleExport);
        assert_eq!(desc.absolute_path(), temp.path().join("src").join("v.ts"));

        let manifest_store = config.manifest_store().unwrap();
        assert_eq!(manifest_store.absolute_path(), manifest_path);
    }

    #[test]
    fn manifest_version_problems() {
        let config = ProjectConfig::from_manifest(&json!({}), Path::new("package.json"), DEFAULT_NAMESPACE).unwrap();
        assert!(matches!(config.manifest_version(), Err(ConfigError::MissingVersion { .. })));
        assert_eq!(config.root(), Path::new("."));

        let config =
            ProjectConfig::from_manifest(&json!({"version": "one"}), Path::new("package.json"), DEFAULT_NAMESPACE)
                .unwrap();
        assert!(matches!(config.manifest_version(), Err(ConfigError::InvalidVersion { .. })));
    }

    #[test]
    fn invalid_json_manifest() {
        let temp = TempDir::new().unwrap();
        let manifest_path = temp.path().join("package.json");
        std::fs::write(&manifest_path, "{ nope").unwrap();
        assert!(matches!(
            ProjectConfig::load(&manifest_path, DEFAULT_NAMESPACE),
            Err(ConfigError::Json { .. })
        ));
    }
}
