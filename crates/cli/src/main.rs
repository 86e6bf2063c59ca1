use clap::{Parser, Subcommand};

mod commands;
mod wiring;

use commands::{OnceArgs, ProfilesArgs, ReportArgs, RunArgs};

#[derive(Parser)]
#[command(name = "autotrader")]
#[command(about = "Trading-profile supervisor with per-scope guardrails", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cycles on the configured timer until Ctrl+C
    Run(RunArgs),
    /// Run a single cycle and print its summary
    Once(OnceArgs),
    /// Print the newest cycle report
    Report(ReportArgs),
    /// List stored profiles
    Profiles(ProfilesArgs),
}

fn init_tracing(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await?,
        Commands::Once(args) => commands::run::once(args).await?,
        Commands::Report(args) => commands::report::run(args).await?,
        Commands::Profiles(args) => commands::profiles::run(args).await?,
    }

    Ok(())
}
