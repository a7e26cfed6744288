use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hisse_dashboard::cli::{self, Cli, Command};
use hisse_dashboard::models::Config;
use hisse_dashboard::sources::SheetsClient;
use hisse_dashboard::ui;

/// Logging setup: the dashboard only surfaces errors so output does not
/// corrupt the alternate screen; headless commands log at info to stderr.
fn init_tracing(interactive: bool) -> Result<()> {
    let subscriber = if interactive {
        FmtSubscriber::builder()
            .with_max_level(Level::ERROR)
            .with_env_filter("hisse_dashboard=error")
            .with_writer(std::io::stderr)
            .finish()
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hisse_dashboard=info"));
        FmtSubscriber::builder()
            .with_max_level(Level::TRACE)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish()
    };

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let command = args.command.unwrap_or(Command::Tui);
    init_tracing(command == Command::Tui)?;

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    match command {
        Command::Tui => {
            if let Err(e) = ui::run_app(config).await {
                eprintln!("❌ TUI Error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Export(export_args) => {
            let client = SheetsClient::new(&config)?;
            let path = cli::run_export(&client, &config, &export_args).await?;
            info!("Done");
            println!("{}", path.display());
        }
        Command::Inspect { json } => {
            let client = SheetsClient::new(&config)?;
            let report = cli::inspect(&client, &config).await?;
            print!("{}", cli::render_report(&report, json)?);
        }
    }

    Ok(())
}
