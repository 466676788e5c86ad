//! Point d'entrée CLI pour ecopoint

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::Commands;
use ecopoint::report::RunStatus;

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Analyser la couverture des points de collecte de déchets par quartier
#[derive(Parser)]
#[command(name = "ecopoint")]
#[command(author, version)]
#[command(about = "Analyser la saturation des points de collecte de déchets par quartier")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let stage = cli.command.stage();
    let args = cli.command.args();
    info!(input = %args.input.display(), stage = %stage, "ecopoint");

    let report = cli::cmd_run(args, stage)?;
    if !cli.quiet {
        report.display();
    }

    if report.status == RunStatus::Failed {
        anyhow::bail!("Analysis failed: {}", report.summary());
    }
    info!("{}", report.summary());

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
