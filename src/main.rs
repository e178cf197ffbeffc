use rmcp::{ServiceExt, transport::stdio};

use skincare_advisor::config::Config;
use skincare_advisor::server::AdvisorServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    // MCP clients may launch us from any CWD: prefer a .env next to the binary.
    match std::env::current_exe().ok().and_then(|exe| exe.parent().map(|d| d.join(".env"))) {
        Some(path) if path.exists() => {
            dotenvy::from_path(&path).ok();
        }
        _ => {
            dotenvy::dotenv().ok();
        }
    }

    tracing::info!("skincare-advisor starting");

    let config = Config::load();
    tracing::info!(
        "analysis model {}, chat model {}, locale {:?}",
        config.analysis_model,
        config.chat_model,
        config.locale
    );
    let server = AdvisorServer::new(config)?;

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("serving error: {e:?}"))?;

    service.waiting().await?;

    tracing::info!("skincare-advisor shutting down");
    Ok(())
}
