//! `versync check` - validate the store declarations

use super::error::HelpfulError;
use super::output::{print_json, violations_json};
use super::{CommandStatus, GlobalArgs};
use serde_json::json;
use versync_stores::{ConfigError, ProjectConfig};

pub fn run(global: &GlobalArgs) -> anyhow::Result<CommandStatus> {
    match ProjectConfig::load(&global.manifest, &global.namespace) {
        Ok(config) => {
            let stores = config.declarations().len();
            let version = config.manifest_version().ok();
            if global.json {
                print_json(&json!({
                    "valid": true,
                    "manifest": global.manifest.to_string_lossy(),
                    "version": version.as_ref().map(|v| v.as_str()),
                    "stores": stores,
                    "violations": [],
                }))?;
            } else {
                println!(
                    "OK: {} version store{} declared in {}",
                    stores,
                    if stores == 1 { "" } else { "s" },
                    global.manifest.display()
                );
                match version {
                    Some(version) => println!("Manifest version: {}", version),
                    None => println!("Manifest version: missing or invalid (only `versync apply` will work)"),
                }
            }
            Ok(CommandStatus::Success)
        }
        Err(ConfigError::Invalid { path, errors }) => {
            if global.json {
                print_json(&json!({
                    "valid": false,
                    "manifest": path,
                    "violations": violations_json(&errors),
                }))?;
            } else {
                println!("INVALID: {}", path);
                for violation in errors.iter() {
                    println!("  - {}", violation);
                }
            }
            Ok(CommandStatus::Failed)
        }
        Err(other) => Err(HelpfulError::from_config(other, &global.namespace).into()),
    }
}
