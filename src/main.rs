use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use talkbridge::{
    create_router, AppState, BackendCredentialSource, Config, LoopbackMediaFactory,
    SessionConfig, TokenClient,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "talkbridge", version, about = "Real-time translation session host")]
struct Cli {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/talkbridge")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve,
    /// Perform one token exchange and print where the media session would connect
    Token {
        #[arg(long)]
        initiator: String,
        #[arg(long)]
        initiator_language: String,
        #[arg(long)]
        counterpart: String,
        #[arg(long)]
        counterpart_language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.service.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let token_client =
        TokenClient::new(cfg.request_timeout()).context("Failed to build token client")?;

    match cli.command {
        Command::Serve => {
            let credentials = Arc::new(BackendCredentialSource::new(
                token_client,
                cfg.backend.api_key.clone(),
                cfg.backend.base_url.clone(),
            ));
            let state = AppState::new(
                credentials,
                Arc::new(LoopbackMediaFactory::default()),
                cfg.controller_options(),
            );

            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;

            info!("HTTP API listening on {}", addr);
            info!("Token backend: {}", cfg.backend.base_url);

            axum::serve(listener, create_router(state))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutting down");
                })
                .await
                .context("HTTP server failed")?;
        }
        Command::Token {
            initiator,
            initiator_language,
            counterpart,
            counterpart_language,
        } => {
            let mut session = SessionConfig::new(initiator, initiator_language, counterpart);
            session.counterpart_language = counterpart_language;
            session.validate()?;

            let credentials = token_client
                .fetch_credentials(&session, &cfg.backend.api_key, &cfg.backend.base_url)
                .await?;

            info!("Session {} credentials issued", session.session_id);
            println!("session_id: {}", session.session_id);
            println!("server_url: {}", credentials.server_url);
            println!("token:      <{} bytes, redacted>", credentials.access_token.len());
        }
    }

    Ok(())
}
