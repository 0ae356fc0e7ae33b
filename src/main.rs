// src/main.rs
// Machina - Remote Machine Control over MCP

use anyhow::Result;
use clap::{Parser, Subcommand};
use machina::config::Config;
use machina::mcp::MachinaServer;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "machina")]
#[command(about = "Remote machine control over MCP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as MCP server on stdio (default)
    Serve,

    /// Run as MCP server on a network listener
    Http {
        /// Host to bind
        #[arg(long, default_value = "127.0.0.1", env = "MACHINA_HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8765", env = "MACHINA_PORT")]
        port: u16,
    },
}

async fn run_stdio_server(config: Config) -> Result<()> {
    let server = MachinaServer::new(config);

    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;

    Ok(())
}

async fn run_http_server(config: Config, host: String, port: u16) -> Result<()> {
    let server = MachinaServer::new(config);

    let app = axum::Router::new().nest_service("/mcp", machina::mcp::http::create_mcp_service(server));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Machina MCP server listening on http://{addr}/mcp");

    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Quiet on stdio: the pipe carries the protocol, logs go to stderr only
    let log_level = match &cli.command {
        Some(Commands::Http { .. }) => Level::INFO,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env();

    match cli.command {
        None | Some(Commands::Serve) => {
            run_stdio_server(config).await?;
        }
        Some(Commands::Http { host, port }) => {
            run_http_server(config, host, port).await?;
        }
    }

    Ok(())
}
