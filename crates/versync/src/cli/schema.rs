//! `versync schema` - print the JSON Schema of a store declaration

use super::output::print_json;
use super::{CommandStatus, GlobalArgs};

#[derive(Debug, clap::Args)]
pub struct SchemaArgs {
    /// Print the schema of the whole manifest, with the stores mounted under `--namespace`
    #[arg(long)]
    pub config: bool,
}

pub fn run(global: &GlobalArgs, args: SchemaArgs) -> anyhow::Result<CommandStatus> {
    let schema = if args.config {
        versync_stores::config_json_schema(&global.namespace)
    } else {
        versync_stores::json_schema()
    };
    print_json(&schema)?;
    Ok(CommandStatus::Success)
}
