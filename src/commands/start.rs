use anyhow::Result;
use collabd::{config::Config, daemon::Daemon};
use tracing::info;

/// Run the daemon in the foreground until interrupted
pub async fn start_daemon(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(addr) = listen {
        config.http.listen_addr = addr;
        config.validate()?;
    }

    info!("Store backend: {:?}", config.store.backend);
    let daemon = Daemon::start(config).await?;
    daemon.run().await
}
