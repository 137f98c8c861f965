use anyhow::Result;
use sessy_bridge::config::Config;
use sessy_bridge::error::SessyError;
use sessy_bridge::logging::init_logging;
use sessy_bridge::runtime::BridgeRuntime;
use sessy_bridge::web;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config.validate()?;
    init_logging(&config.logging)?;

    info!("Sessy bridge {} starting up", env!("APP_VERSION"));

    let runtime = BridgeRuntime::from_config(&config)?;
    let runtime = Arc::new(Mutex::new(runtime));

    if let Err(e) = runtime.lock().await.start() {
        error!("Plugin failed to start: {}", e);
    }

    let web_task = if config.web.enabled {
        let web_runtime = runtime.clone();
        let (host, port) = (config.web.host.clone(), config.web.port);
        Some(tokio::spawn(async move {
            if let Err(e) = web::serve(web_runtime, &host, port).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    let period = runtime.lock().await.heartbeat_interval();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut rt = runtime.lock().await;
                match rt.heartbeat().await {
                    Ok(()) => {}
                    Err(SessyError::TooManyRetries) => {
                        error!("Heartbeat aborted: too many failed retries");
                    }
                    Err(e) => warn!("Heartbeat failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    runtime.lock().await.stop();
    if let Some(task) = web_task {
        task.abort();
    }
    info!("Sessy bridge shutdown complete");
    Ok(())
}
