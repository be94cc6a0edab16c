//! `versync apply <VERSION>` - write an explicit version into every store

use super::error::HelpfulError;
use super::{load_config, run_batch, BatchArgs, CommandStatus, GlobalArgs};
use tracing::info;
use versync_stores::VersionString;

#[derive(Debug, clap::Args)]
pub struct ApplyArgs {
    /// Version to write, e.g. 1.4.0 or 2.0.0-rc.1
    pub version: String,

    /// Also write the version into the manifest's own "version" field
    #[arg(long)]
    pub update_manifest: bool,

    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run(global: &GlobalArgs, args: ApplyArgs) -> anyhow::Result<CommandStatus> {
    let version = VersionString::parse(&args.version).map_err(|_| HelpfulError::invalid_version(&args.version))?;
    let config = load_config(global)?;

    let mut stores = config.version_set();
    if args.update_manifest {
        let manifest_store = config
            .manifest_store()
            .ok_or_else(|| HelpfulError::manifest_not_a_store(config.manifest_path()))?;
        stores.push(manifest_store);
    }
    info!(version = %version, stores = stores.len(), "Applying explicit version");

    run_batch(global, &version, &stores, &args.batch)
}
