use crate::prelude::*;
use crate::steca::packet;

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Upper bound on one response read; comfortably larger than any
/// telegram the inverter sends.
pub const MAX_TELEGRAM_BYTES: usize = 1024;

/// Half-duplex byte transport to the inverter. The coordinator owns
/// exactly one of these for the whole send+receive round-trip; the bus
/// is single-master and does not tolerate interleaved requests.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read one response buffer, bounded by the transport read timeout.
    /// Times out with an error rather than blocking indefinitely.
    async fn receive(&mut self) -> Result<Vec<u8>>;
}

pub struct SerialTransport {
    port: SerialStream,
    read_timeout: Duration,
}

impl SerialTransport {
    /// Open the RS485 port. The StecaGrid talks 38400 8N1; only the
    /// device path, baudrate and timeout are configurable.
    pub fn open(serial: &config::Serial) -> Result<Self> {
        let port = tokio_serial::new(serial.device(), serial.baudrate())
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()
            .map_err(|e| anyhow!("failed to open serial port {}: {}", serial.device(), e))?;

        info!("opened {} at {} baud", serial.device(), serial.baudrate());

        Ok(Self {
            port,
            read_timeout: Duration::from_millis(serial.read_timeout_ms()),
        })
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        debug!("TX: {}", packet::hex_string(bytes));
        self.port.write_all(bytes).await?;
        self.port.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 256];
        let deadline = tokio::time::Instant::now() + self.read_timeout;

        // Accumulate until we hold one full telegram or the deadline
        // passes; a partial buffer is returned as-is and left for the
        // framer to reject.
        while !packet::validate(&buffer) && buffer.len() < MAX_TELEGRAM_BYTES {
            let remaining =
                deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }

            match tokio::time::timeout(remaining, self.port.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break,
            }
        }

        if buffer.is_empty() {
            bail!("no response within {:?}", self.read_timeout);
        }

        debug!("RX: {}", packet::hex_string(&buffer));
        Ok(buffer)
    }
}
