use anyhow::Context;
use clap::Parser;
use invoice_qa::config::load_dotenv;
use invoice_qa::{AppState, Args, Config, GeminiClient, router};
use std::sync::Arc;

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so clap sees its values
    let dotenv = load_dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = dotenv {
        log::warn!("Ignoring unreadable .env file: {}", e);
    }

    let args = Args::parse();
    log::debug!("{:?}", args);

    let config = Config::from_args(&args).context("invalid configuration")?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    let model = GeminiClient::new(config.qa.clone())?;
    let state = AppState::new(Arc::new(model), config.max_upload_bytes)?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    log::info!(
        "Invoice Q&A form on http://{} (model {})",
        config.bind,
        config.qa.model
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
