pub mod channels;    // Coordinator -> MQTT channel bundle
pub mod config;      // Configuration management
pub mod coordinator; // Polling loop and request/response exchanges
pub mod mqtt;        // MQTT client and messaging
pub mod options;     // Command line options parsing
pub mod prelude;     // Common imports and types
pub mod steca;       // StecaGrid RS485 protocol implementation

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::coordinator::Coordinator;
use crate::mqtt::Mqtt;
use crate::steca::serial::SerialTransport;
use std::sync::Arc;

fn init_logger(filter: &str) {
    use std::io::Write;

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init();
}

/// Main application entry point: wire up the MQTT task and run the
/// coordinator until the shutdown signal arrives.
pub async fn app(shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
    let options = Options::new();

    let config = Arc::new(Config::new(options.config_file.clone())?);

    let filter = if options.verbose {
        "debug".to_string()
    } else {
        config.loglevel()
    };
    init_logger(&filter);

    info!(
        "steca-bridge {} starting with config file {}",
        CARGO_PKG_VERSION, options.config_file
    );

    let channels = Channels::new();

    let mqtt = Mqtt::new(config.clone(), channels.clone());
    let mqtt_clone = mqtt.clone();
    let mqtt_handle = tokio::spawn(async move {
        if let Err(e) = mqtt_clone.start().await {
            error!("MQTT task failed: {}", e);
        }
    });

    let transport = SerialTransport::open(config.serial())?;
    let mut coordinator = Coordinator::new(config, channels, transport);

    let result = coordinator.start(shutdown_rx).await;

    // coordinator is done (shutdown or startup validation error);
    // release the mqtt task before reporting
    let _ = mqtt.stop().await;
    let _ = mqtt_handle.await;

    info!("shutdown complete");
    result
}
