use std::path::PathBuf;

use clap::Parser;

use tock_sniper::config::Config;

/// tock-sniper: claim a Tock reservation the instant it releases
#[derive(Parser)]
#[command(name = "tock-sniper", version, about)]
struct Cli {
    /// Path to a JSON settings file (defaults apply for missing fields)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Run Chrome without a visible window
    #[arg(long)]
    headless: bool,

    /// Scan and report matching slots without clicking
    #[arg(long)]
    dry_run: bool,

    /// Number of browser sessions to race (overrides the config file)
    #[arg(long)]
    sessions: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.headless {
        config.headless = true;
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(sessions) = cli.sessions {
        config.sessions = sessions;
    }
    config.validate()?;

    tracing::info!(
        "Starting tock-sniper ({} session(s), dry_run: {})",
        config.sessions,
        config.dry_run
    );

    tokio::select! {
        result = tock_sniper::snipe::run(config) => { result?; }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received interrupt signal, shutting down");
        }
    }

    Ok(())
}
