//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;
use versync_stores::ConfigError;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Individual problems (one per configuration violation)
    pub details: Vec<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            details: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_details(mut self, details: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.details.extend(details.into_iter().map(|d| d.into()));
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    // === Common error constructors ===

    /// Manifest missing or unreadable
    pub fn manifest_unreadable(path: &str, reason: &str) -> Self {
        Self::new(format!("Cannot read manifest: {}", path))
            .with_context(reason.to_string())
            .with_suggestion(format!("TRY: Check that the file exists: ls -la {}", path))
            .with_suggestion("TRY: Point at another manifest: versync --manifest path/to/package.json check")
    }

    /// Version argument is not a semantic version
    pub fn invalid_version(input: &str) -> Self {
        Self::new(format!("Not a semantic version: '{}'", input))
            .with_context("Versions must look like MAJOR.MINOR.PATCH with optional -prerelease and +build parts")
            .with_suggestion("TRY: versync apply 1.4.0")
            .with_suggestion("TRY: Drop a leading 'v' (v1.4.0 -> 1.4.0)")
    }

    /// Map a manifest loading error onto a helpful one.
    pub fn from_config(err: ConfigError, namespace: &str) -> Self {
        match err {
            ConfigError::Io { path, source } => Self::manifest_unreadable(&path, &source.to_string()),
            ConfigError::Json { path, source } => Self::new(format!("Manifest is not valid JSON: {}", path))
                .with_context(source.to_string())
                .with_suggestion("TRY: Fix the syntax error at the reported line and column"),
            ConfigError::MissingVersion { path } => Self::new(format!("Manifest has no version: {}", path))
                .with_context("`versync sync` copies the manifest's top-level \"version\" field")
                .with_suggestion("TRY: Add \"version\": \"0.1.0\" to the manifest")
                .with_suggestion("TRY: Pass the version explicitly: versync apply 0.1.0"),
            ConfigError::InvalidVersion { path, source } => Self::new(format!("Manifest version is invalid: {}", path))
                .with_context(source.to_string())
                .with_suggestion("TRY: Use a semantic version such as 1.4.0"),
            ConfigError::Invalid { path, errors } => Self::new(format!(
                "Invalid version store configuration in {} ({} problem{})",
                path,
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ))
            .with_context(format!("Stores are read from {}.versioning.stores", namespace))
            .with_details(errors.iter().map(|e| e.to_string()))
            .with_suggestion("TRY: versync schema    # print the accepted declaration shapes"),
        }
    }

    /// Manifest path cannot be turned into a store path
    pub fn manifest_not_a_store(path: &Path) -> Self {
        Self::new(format!("Cannot use the manifest as a version store: {}", path.display()))
            .with_context("--update-manifest needs a manifest path that ends in a UTF-8 file name")
            .with_suggestion("TRY: Pass the manifest file itself, not its directory: --manifest ./package.json")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        for detail in &self.details {
            writeln!(f, "  - {}", detail)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as JSON on stdout (for `--json` mode).
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": {
                "message": helpful.message,
                "context": helpful.context,
                "details": helpful.details,
                "suggestions": helpful.suggestions,
            }
        }),
        None => serde_json::json!({
            "error": {
                "message": format!("{:#}", err),
            }
        }),
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{{\"error\":{{\"message\":\"{}\"}}}}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versync_stores::{ValidationError, ValidationErrors};

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something broke")
            .with_context("While testing")
            .with_suggestion("TRY: Fix it");

        let display = err.to_string();
        assert!(display.contains("ERROR: Something broke"));
        assert!(display.contains("CONTEXT: While testing"));
        assert!(display.contains("TRY: Fix it"));
    }

    #[test]
    fn test_invalid_config_lists_every_violation() {
        let errors = ValidationErrors(vec![
            ValidationError {
                instance_path: "/versync/versioning/stores/0/path".to_string(),
                expected: "a file path".to_string(),
                actual: "nothing".to_string(),
            },
            ValidationError {
                instance_path: "/versync/versioning/stores/1/exportName".to_string(),
                expected: "an identifier".to_string(),
                actual: "\"1x\"".to_string(),
            },
        ]);
        let err = HelpfulError::from_config(
            ConfigError::Invalid {
                path: "package.json".to_string(),
                errors,
            },
            "versync",
        );
        assert!(err.message.contains("2 problems"));
        assert_eq!(err.details.len(), 2);
        assert!(err.details[1].contains("/versync/versioning/stores/1/exportName"));
    }

    #[test]
    fn test_invalid_version() {
        let err = HelpfulError::invalid_version("v1.0");
        assert!(err.message.contains("v1.0"));
        assert!(err.suggestions.iter().any(|s| s.contains("leading 'v'")));
    }
}
