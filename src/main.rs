use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epic_ai::api::{self, AppState};
use epic_ai::autopilot::AutopilotDispatcher;
use epic_ai::config::Config;
use epic_ai::mcp;

#[derive(Parser)]
#[command(name = "epic-ai")]
#[command(about = "Marketing flywheel and social autopilot service")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
    /// Start MCP server via stdio
    Mcp,
    /// Check server status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the MCP transport owns stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "epic_ai=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await?,
        Commands::Mcp => {
            let db = config.open_database()?;
            let dispatcher = AutopilotDispatcher::with_publisher(db.clone(), config.publisher()?);

            mcp::run_stdio_server(db, Arc::new(dispatcher)).await?;
        }
        Commands::Status => status(&config).await?,
    }

    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let db = config.open_database()?;
    let tokens = config.token_service()?;
    let trigger_secret = config.trigger_secret()?;
    let dispatcher = AutopilotDispatcher::with_publisher(db.clone(), config.publisher()?);

    let app = api::create_router(AppState::new(db, tokens, trigger_secret, dispatcher));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Epic AI server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let url = format!("http://{}/health", config.bind_address());
    println!("Checking Epic AI server status at {}...", url);

    match reqwest::get(&url).await {
        Ok(response) if response.status().is_success() => println!("Server is running"),
        Ok(response) => println!("Server responded with {}", response.status()),
        Err(err) => {
            tracing::debug!(error = %err, "Health check failed");
            println!("Server is not running");
        }
    }

    Ok(())
}
