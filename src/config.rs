use crate::prelude::*;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_serial")]
    pub serial: Serial,
    pub mqtt: Mqtt,

    /// Ordered list of metric names polled once per cycle.
    pub values_of_interest: Vec<String>,

    #[serde(default = "Config::default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

// Serial {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Serial {
    #[serde(default = "Config::default_serial_device")]
    pub device: String,

    #[serde(default = "Config::default_serial_baudrate")]
    pub baudrate: u32,

    #[serde(default = "Config::default_serial_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Serial {
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn baudrate(&self) -> u32 {
        self.baudrate
    }

    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_ms
    }
} // }}}

// Mqtt {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Mqtt {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub host: String,
    #[serde(default = "Config::default_mqtt_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "Config::default_mqtt_topic")]
    pub topic: String,
}

impl Mqtt {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &Option<String> {
        &self.username
    }

    pub fn password(&self) -> &Option<String> {
        &self.password
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    pub fn mqtt(&self) -> &Mqtt {
        &self.mqtt
    }

    pub fn values_of_interest(&self) -> &[String] {
        &self.values_of_interest
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    pub fn loglevel(&self) -> String {
        self.loglevel.clone()
    }

    fn default_serial() -> Serial {
        Serial {
            device: Self::default_serial_device(),
            baudrate: Self::default_serial_baudrate(),
            read_timeout_ms: Self::default_serial_read_timeout_ms(),
        }
    }

    fn default_serial_device() -> String {
        "/dev/ttyS0".to_string()
    }

    fn default_serial_baudrate() -> u32 {
        38400
    }

    fn default_serial_read_timeout_ms() -> u64 {
        1000
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_mqtt_port() -> u16 {
        1883
    }

    fn default_mqtt_topic() -> String {
        "stecagrid".to_string()
    }

    fn default_poll_interval_secs() -> u64 {
        1
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}
