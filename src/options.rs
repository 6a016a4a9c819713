use clap::Parser;

/// Feed MQTT with telemetry read from a StecaGrid 3600 over RS485
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Enable verbose output regardless of the configured loglevel
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}
