//! `versync list` - show the resolved version stores

use super::output::{print_json, print_table_colored};
use super::{load_config, CommandStatus, GlobalArgs};
use comfy_table::Color;
use serde_json::json;
use versync_stores::StoreKind;

fn kind_color(kind: StoreKind) -> Color {
    match kind {
        StoreKind::StructuredField => Color::Yellow,
        StoreKind::ModuleExport => Color::Magenta,
        StoreKind::TextPattern => Color::White,
    }
}

pub fn run(global: &GlobalArgs) -> anyhow::Result<CommandStatus> {
    let config = load_config(global)?;
    let set = config.version_set();

    if global.json {
        let stores: Vec<_> = set
            .iter()
            .map(|desc| {
                json!({
                    "path": desc.store_path().as_str(),
                    "absolute_path": desc.absolute_path().to_string_lossy(),
                    "kind": desc.kind().as_str(),
                    "target": desc.strategy().describe(),
                    "exists": desc.absolute_path().exists(),
                })
            })
            .collect();
        print_json(&json!({ "stores": stores }))?;
        return Ok(CommandStatus::Success);
    }

    if set.is_empty() {
        println!("No version stores declared.");
        println!();
        println!("Declare them in {} under:", config.manifest_path().display());
        println!("  \"{}\": {{ \"versioning\": {{ \"stores\": [ ... ] }} }}", config.namespace());
        println!("TRY: versync schema    # print the accepted declaration shapes");
        return Ok(CommandStatus::Success);
    }

    let headers = &["#", "KIND", "PATH", "TARGET"];
    let rows: Vec<Vec<(String, Option<Color>)>> = set
        .iter()
        .enumerate()
        .map(|(idx, desc)| {
            let path_color = if desc.absolute_path().exists() {
                None
            } else {
                Some(Color::Red)
            };
            vec![
                ((idx + 1).to_string(), None),
                (desc.kind().to_string(), Some(kind_color(desc.kind()))),
                (desc.store_path().to_string(), path_color),
                (desc.strategy().describe(), None),
            ]
        })
        .collect();
    print_table_colored(headers, rows);
    Ok(CommandStatus::Success)
}
