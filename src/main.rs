//! # Venture Validator CLI (`vv`)
//!
//! The `vv` binary runs the report server and the terminal client that
//! consumes it.
//!
//! ## Usage
//!
//! ```bash
//! vv --config ./config/vv.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vv serve` | Start the HTTP server that streams reports |
//! | `vv validate "<idea>"` | Stream a report from the server and print it |
//! | `vv units` | List the analysis units in the registry |
//!
//! ## Examples
//!
//! ```bash
//! # Start the server with mock content
//! vv serve --config ./config/vv.toml
//!
//! # In another terminal
//! vv validate "A tool that helps indie game devs monetize their Discord communities"
//!
//! # Machine-readable report, JSON progress on stderr
//! vv validate "meal kits for campers" --json --progress json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use venture_validator::config::{self, Config};
use venture_validator::progress::ProgressMode;
use venture_validator::registry::UnitRegistry;
use venture_validator::{report, server};

/// Venture Validator: a streaming, multi-unit startup idea report.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist the built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "vv",
    about = "Venture Validator: stream a multi-unit startup validation report",
    version,
    long_about = "Venture Validator fans one startup idea out to a set of concurrent analysis \
    units and streams each unit's result back as server-sent events. The same binary runs the \
    server and a terminal client that renders the report as it arrives."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/vv.toml`. A missing file means defaults; a
    /// present but invalid file is an error.
    #[arg(long, global = true, default_value = "./config/vv.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the report server.
    ///
    /// Binds to `[server].bind` and serves `POST /api/validate`,
    /// `GET /api/units`, and `GET /health` until Ctrl-C.
    Serve,

    /// Stream a report for a startup idea and print it.
    ///
    /// Connects to `[client].base_url`. Ctrl-C cancels the run.
    Validate {
        /// The idea to validate (at least `[stream].min_query_chars` characters).
        query: String,

        /// Print the final report as JSON on stdout.
        #[arg(long)]
        json: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressArg>,
    },

    /// List the analysis units.
    Units,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProgressArg {
    Off,
    Human,
    Json,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "venture_validator=debug,vv=debug"
    } else {
        "venture_validator=info,vv=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found; using defaults");
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Listing needs no config
    if let Commands::Units = cli.command {
        report::list_units(&UnitRegistry::builtin());
        return Ok(());
    }

    let cfg = resolve_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Validate {
            query,
            json,
            progress,
        } => {
            let mode = progress
                .map(ProgressMode::from)
                .unwrap_or_else(ProgressMode::default_for_tty);
            report::run_validate(&cfg, &query, json, mode).await?;
        }
        Commands::Units => unreachable!(),
    }

    Ok(())
}
