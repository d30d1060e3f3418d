mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use medallion_dashboard::render;
use medallion_processing::{InvocationResult, PipelineConfig, Stage};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::{connect_store, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bronze/silver/gold CSV pipeline over object storage", long_about = None)]
struct Cli {
    /// Use a local directory (<root>/<bucket>/<key>) instead of S3
    #[arg(long, global = true)]
    local_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a bronze object into the silver tier
    BronzeToSilver(EventArgs),
    /// Score a silver object and publish gold outputs
    SilverToGold(EventArgs),
    /// Serve both stages and the dashboard over HTTP
    Serve(ServeArgs),
    /// Show the latest gold snapshots
    Dashboard(DashboardArgs),
}

#[derive(Args, Debug, Default)]
struct EventArgs {
    /// Trigger payload JSON file; read from stdin when omitted
    #[arg(long)]
    event: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,
}

#[derive(Args, Debug, Default)]
struct DashboardArgs {
    /// Snapshot key to display; defaults to the first one
    #[arg(long)]
    key: Option<String>,
    /// Redraw every N seconds until interrupted
    #[arg(long)]
    refresh: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("invalid pipeline configuration")?;
    let store = connect_store(&config, cli.local_root).await?;
    let state = Arc::new(AppState::new(config, store));

    match cli.command {
        Command::BronzeToSilver(args) => run_stage(&state.bronze_to_silver, args).await,
        Command::SilverToGold(args) => run_stage(&state.silver_to_gold, args).await,
        Command::Serve(args) => serve(state, args).await,
        Command::Dashboard(args) => show_dashboard(&state, args).await,
    }
}

async fn run_stage(stage: &dyn Stage, args: EventArgs) -> Result<()> {
    let raw = match &args.event {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read event file {}", path.display()))?,
        None => {
            let mut buffer = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buffer)
                .await
                .context("failed to read event from stdin")?;
            buffer
        }
    };
    let outcome = stage.handle_slice(&raw).await?;
    let result = InvocationResult::from(&outcome);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn serve(state: Arc<AppState>, args: ServeArgs) -> Result<()> {
    let listener = TcpListener::bind(args.addr).await?;
    info!(bucket = %state.config.bucket, "listening on {}", listener.local_addr()?);
    axum::serve(listener, routes::router(state).into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;
    Ok(())
}

async fn show_dashboard(state: &AppState, args: DashboardArgs) -> Result<()> {
    loop {
        let view = state.dashboard.view(args.key.as_deref()).await?;
        println!("{}", render(&view));

        let Some(seconds) = args.refresh else {
            return Ok(());
        };
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
