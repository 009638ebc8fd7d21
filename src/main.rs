use anyhow::Result;
use entsoe::areas::AreaConfig;
use entsoe::client::EntsoeClient;
use entsoe::config::Config;
use entsoe::coordinator::Coordinator;
use entsoe::logging::{get_logger, init_logging};
use entsoe::persistence::PersistenceManager;
use entsoe::sensor::{SensorSet, stored_price_lists};
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    let logger = get_logger("main");

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let area = AreaConfig::from_config(&config.entsoe)?;
    logger.info(&format!(
        "ENTSO-e price bridge {} starting for {} ({})",
        env!("APP_VERSION"),
        area.area.name,
        area.area.key
    ));

    let client = EntsoeClient::from_config(&config.entsoe)?;
    let mut coordinator = Coordinator::new(area.clone(), config.coordinator.clone(), Arc::new(client));

    let mut store = PersistenceManager::new(&config.persistence.state_file);
    if let Err(e) = store.load() {
        logger.warn(&format!("Ignoring unreadable state file: {}", e));
    }
    let (today, tomorrow) = stored_price_lists(&store, &area);
    coordinator.restore(&today, &tomorrow);
    let store = Arc::new(Mutex::new(store));

    let handle = coordinator.handle();
    let sensors = SensorSet::spawn(
        &handle,
        &area,
        config.sensors.refresh_interval_minutes,
        Some(store),
    );

    #[cfg(feature = "web")]
    let web_task = {
        let state = entsoe::web::AppState {
            coordinator: handle.clone(),
            sensors: sensors.registry(),
            config: Arc::new(config.clone()),
        };
        let (host, port) = (config.web.host.clone(), config.web.port);
        let web_logger = logger.clone();
        tokio::spawn(async move {
            if let Err(e) = entsoe::web::serve(state, &host, port).await {
                web_logger.error(&format!("Web server error: {}", e));
            }
        })
    };

    let shutdown_handle = handle.clone();
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                signal_logger.info("Interrupt received, shutting down");
                shutdown_handle.shutdown();
            }
            Err(e) => signal_logger.warn(&format!("Cannot listen for interrupts: {}", e)),
        }
    });

    let result = coordinator.run().await;

    sensors.shutdown().await;
    #[cfg(feature = "web")]
    web_task.abort();

    match result {
        Ok(()) => {
            logger.info("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            logger.error(&format!("Coordinator failed with error: {}", e));
            Err(anyhow::anyhow!("Coordinator error: {}", e))
        }
    }
}
