use anyhow::Context;
use tracing::info;

use forward_auth_proxy::modules::{self, logger};
use forward_auth_proxy::proxy::AxumServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logger::init_logger();

    let config = modules::load_proxy_config().context("Failed to load configuration")?;
    let bind_addr = config.get_bind_address();
    let state = forward_auth_proxy::build_state(config).context("Failed to initialize proxy state")?;

    let (server, handle) = AxumServer::start(&bind_addr, state)
        .await
        .map_err(anyhow::Error::msg)?;

    shutdown_signal().await?;
    info!("Shutdown signal received");

    server.stop();
    handle.await.context("Server task panicked")?;
    Ok(())
}

/// Ctrl-C, or SIGTERM from the hosting platform
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("Failed to listen for Ctrl-C")?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    Ok(())
}
