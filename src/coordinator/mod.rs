use crate::prelude::*;
use crate::steca::packet::{self, Reading};
use crate::steca::requests;
use crate::steca::serial::Transport;
use crate::steca::value::Unit;

use std::sync::Arc;
use std::time::Duration;

/// Drives the request/response cycle: one metric at a time, one
/// telegram out, one telegram back, decoded reading off to MQTT.
/// Owns the transport for the whole round-trip; the bus is half-duplex
/// single-master and requests are never overlapped.
pub struct Coordinator<T: Transport> {
    config: Arc<Config>,
    channels: Channels,
    transport: T,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(config: Arc<Config>, channels: Channels, transport: T) -> Self {
        Self {
            config,
            channels,
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn start(&mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        // fail on config typos before the first poll, not during it
        requests::validate_metrics(self.config.values_of_interest())?;

        let interval = Duration::from_secs(self.config.poll_interval_secs());
        let metrics = self.config.values_of_interest().to_vec();

        info!("polling {} metrics every {:?}", metrics.len(), interval);

        loop {
            for name in &metrics {
                match self.request_metric(name).await? {
                    Some(reading) => self.publish(name, &reading)?,
                    None => debug!("{}: no data this cycle", name),
                }
            }

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("coordinator received shutdown signal");
                    return Ok(());
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// One transport round-trip for one metric. Framing failures,
    /// transport errors and timeouts all mean "no data this cycle",
    /// never a hard failure; only an unknown metric name is an error.
    pub async fn request_metric(&mut self, name: &str) -> Result<Option<Reading>> {
        let request =
            requests::request_for(name).ok_or_else(|| anyhow!("unknown metric: {}", name))?;

        if let Err(e) = self.transport.send(request).await {
            warn!("{}: send failed: {}", name, e);
            return Ok(None);
        }

        let buffer = match self.transport.receive().await {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("{}: receive failed: {}", name, e);
                return Ok(None);
            }
        };

        if !packet::validate(&buffer) {
            debug!(
                "{}: not a single full telegram: {}",
                name,
                packet::hex_string(&buffer)
            );
            return Ok(None);
        }

        let mut readings = packet::dispatch(&buffer);
        if readings.is_empty() {
            return Ok(None);
        }
        let reading = readings.swap_remove(0);

        // a NUL-unit float is the inverter's way of saying "no reading"
        if reading.value.unit() == Some(Unit::None) {
            return Ok(None);
        }

        // the lifetime export counter never legitimately reads zero;
        // an exact 0.0 is a transient decode or transport fault
        if name == requests::TOTAL_EXPORT_METRIC {
            if let packet::DecodedValue::Float(v, _) = reading.value {
                if v == 0.0 {
                    warn!("{}: suppressing zero counter reading", name);
                    return Ok(None);
                }
            }
        }

        debug!("{}: {} = {}", name, reading.label, reading.value);
        Ok(Some(reading))
    }

    fn publish(&self, name: &str, reading: &Reading) -> Result<()> {
        let message = mqtt::Message {
            topic: name.to_string(),
            retain: false,
            payload: reading.value.payload()?,
        };

        if self
            .channels
            .to_mqtt
            .send(mqtt::ChannelData::Message(message))
            .is_err()
        {
            // nobody listening (mqtt disabled or shut down); not fatal
            warn!("{}: no mqtt receiver for reading", name);
        }

        Ok(())
    }
}
