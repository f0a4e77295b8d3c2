//! CLI application for bank transfer receipt parsing and bookkeeping.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, delete, list, parse, submit};

/// Bank transfer receipts - Extract, deduplicate and keep transfer records
#[derive(Parser)]
#[command(name = "vouch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// SQLite database file (overrides the configured one)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single receipt transcript
    Parse(parse::ParseArgs),

    /// Parse many receipt transcripts
    Batch(batch::BatchArgs),

    /// Submit a transfer form or a receipt to the ledger
    Submit(submit::SubmitArgs),

    /// List or search stored transfers
    List(list::ListArgs),

    /// Delete a stored transfer
    Delete(delete::DeleteArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let ctx = commands::Context {
        config_path: cli.config,
        database: cli.database,
    };

    match cli.command {
        Commands::Parse(args) => parse::run(args, &ctx).await,
        Commands::Batch(args) => batch::run(args, &ctx).await,
        Commands::Submit(args) => submit::run(args, &ctx).await,
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Delete(args) => delete::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
