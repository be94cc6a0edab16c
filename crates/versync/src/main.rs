//! versync - keep version stores in sync with the manifest version

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use versync_logging::LogConfig;
use versync_stores::{DEFAULT_MANIFEST, DEFAULT_NAMESPACE};

#[derive(Parser, Debug)]
#[command(name = "versync", version, about = "Sync the manifest version into every declared version store")]
struct Cli {
    /// Project manifest holding the version and the store declarations
    #[arg(long, global = true, env = "VERSYNC_MANIFEST", default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,

    /// Manifest key under which `versioning.stores` lives
    #[arg(long, global = true, env = "VERSYNC_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Print machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Also write a daily rolling log file into this directory
    #[arg(long, global = true, env = "VERSYNC_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the store declarations and report every violation
    Check,

    /// List the resolved version stores
    List,

    /// Write the manifest's own version into every store
    Sync(cli::sync::SyncArgs),

    /// Write an explicit version into every store
    Apply(cli::apply::ApplyArgs),

    /// Print the JSON Schema of a store declaration (or of the manifest with --config)
    Schema(cli::schema::SchemaArgs),
}

fn run_command(cli: Cli) -> anyhow::Result<cli::CommandStatus> {
    let global = cli::GlobalArgs {
        manifest: cli.manifest,
        namespace: cli.namespace,
        json: cli.json,
    };

    match cli.command {
        Commands::Check => cli::check::run(&global),
        Commands::List => cli::list::run(&global),
        Commands::Sync(args) => cli::sync::run(&global, args),
        Commands::Apply(args) => cli::apply::run(&global, args),
        Commands::Schema(args) => cli::schema::run(&global, args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match versync_logging::init_logging(LogConfig {
        app_name: "versync",
        verbose: cli.verbose,
        log_dir: cli.log_dir.clone(),
    }) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {:#}", err);
            None
        }
    };

    let json_mode = cli.json;
    match run_command(cli) {
        Ok(status) => status.exit_code(),
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
