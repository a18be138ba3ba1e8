mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "retslip",
    version,
    about = "Rebuild return-slip records from raw tables extracted out of PDF reports"
)]
struct Cli {
    /// Log pipeline decisions (corrector passes, merges) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble canonical records from one or more raw table dumps (.json or .xlsx)
    Assemble {
        /// Raw table files; each is one extraction attempt and the best one wins
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Custom JSON profile (default: built-in outstanding-returns)
        #[arg(short, long, value_name = "FILE")]
        profile: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write records as JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Also print pipeline events (rejections, corrections, merges)
        #[arg(long)]
        events: bool,
    },
    /// Check completeness of the assembled slip sequence
    Validate {
        /// Raw table files; each is one extraction attempt and the best one wins
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Custom JSON profile (default: built-in outstanding-returns)
        #[arg(short, long, value_name = "FILE")]
        profile: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Business KPIs: closure rates, time to close, alerts
    Summary {
        /// Raw table files; each is one extraction attempt and the best one wins
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Custom JSON profile (default: built-in outstanding-returns)
        #[arg(short, long, value_name = "FILE")]
        profile: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate pipeline profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print a built-in profile as JSON
    Show {
        /// Preset name (default: outstanding-returns)
        name: Option<String>,
    },
    /// Validate a custom profile file
    Validate {
        /// Path to JSON profile
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Assemble {
            files,
            profile,
            output,
            out,
            events,
        } => commands::assemble::run(files, profile, &output, out, events),
        Commands::Validate {
            files,
            profile,
            output,
        } => commands::validate::run(files, profile, &output),
        Commands::Summary {
            files,
            profile,
            output,
        } => commands::summary::run(files, profile, &output),
        Commands::Profile { action } => match action {
            ProfileAction::Show { name } => commands::profile::show(name.as_deref()),
            ProfileAction::Validate { file } => commands::profile::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
