//! `versync sync` - copy the manifest version into every store

use super::error::HelpfulError;
use super::{load_config, run_batch, BatchArgs, CommandStatus, GlobalArgs};
use tracing::info;

#[derive(Debug, clap::Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

pub fn run(global: &GlobalArgs, args: SyncArgs) -> anyhow::Result<CommandStatus> {
    let config = load_config(global)?;
    let version = config
        .manifest_version()
        .map_err(|err| HelpfulError::from_config(err, &global.namespace))?;
    let stores = config.version_set();
    info!(version = %version, stores = stores.len(), "Syncing manifest version");

    run_batch(global, &version, &stores, &args.batch)
}
