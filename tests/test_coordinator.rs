mod common;
use common::*;

use steca_bridge::channels::Channels;
use steca_bridge::config::{self, Config};
use steca_bridge::coordinator::Coordinator;
use steca_bridge::prelude::*;
use steca_bridge::steca::packet::DecodedValue;
use steca_bridge::steca::serial::Transport;
use steca_bridge::steca::value::Unit;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;

struct MockTransport {
    sent: Vec<Vec<u8>>,
    responses: VecDeque<Result<Vec<u8>>>,
}

impl MockTransport {
    fn respond_with(responses: Vec<Result<Vec<u8>>>) -> Self {
        Self {
            sent: Vec::new(),
            responses: responses.into(),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no response queued")))
    }
}

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        serial: config::Serial {
            device: "/dev/null".to_string(),
            baudrate: 38400,
            read_timeout_ms: 10,
        },
        mqtt: config::Mqtt {
            enabled: false,
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            topic: "stecagrid".to_string(),
        },
        values_of_interest: vec!["ELECTRICITY_EXPORTED_TOTAL".to_string()],
        poll_interval_secs: 1,
        loglevel: "info".to_string(),
    })
}

fn coordinator(transport: MockTransport) -> Coordinator<MockTransport> {
    Coordinator::new(test_config(), Channels::new(), transport)
}

fn total_yield_response(le_bytes: [u8; 4]) -> Vec<u8> {
    telegram(0x65, 0xF1, &le_bytes)
}

#[tokio::test]
async fn unknown_metric_is_an_error() {
    let mut c = coordinator(MockTransport::respond_with(vec![]));
    assert!(c.request_metric("NOT_A_METRIC").await.is_err());
}

#[tokio::test]
async fn decoded_total_yield_comes_back_labelled() {
    // 1.0f32 little-endian
    let transport =
        MockTransport::respond_with(vec![Ok(total_yield_response([0x00, 0x00, 0x80, 0x3F]))]);
    let mut c = coordinator(transport);

    let reading = c
        .request_metric("ELECTRICITY_EXPORTED_TOTAL")
        .await
        .unwrap()
        .expect("should decode a reading");
    assert_eq!(reading.label, "Total Yield");
    assert_eq!(reading.value, DecodedValue::Float(1.0, Unit::WattHour));
}

#[tokio::test]
async fn request_sends_the_mapped_telegram() {
    let transport =
        MockTransport::respond_with(vec![Ok(total_yield_response([0x00, 0x00, 0x80, 0x3F]))]);
    let mut c = coordinator(transport);
    let _ = c.request_metric("ELECTRICITY_EXPORTED_TOTAL").await;

    assert_eq!(
        c.transport().sent,
        vec![steca_bridge::steca::requests::SG_TOTAL_YIELD.to_vec()]
    );
}

#[tokio::test]
async fn zero_total_yield_is_suppressed() {
    // a lifetime counter reading exactly zero is a transient fault,
    // never a real meter reset; it must not be forwarded
    let transport =
        MockTransport::respond_with(vec![Ok(total_yield_response([0x00, 0x00, 0x00, 0x00]))]);
    let mut c = coordinator(transport);

    let reading = c.request_metric("ELECTRICITY_EXPORTED_TOTAL").await.unwrap();
    assert_eq!(reading, None);
}

#[tokio::test]
async fn zero_is_not_suppressed_for_other_metrics() {
    // AC power genuinely reads 0.0 at night
    let mut payload = vec![0x00, 0x00, 0x08];
    payload.extend_from_slice(b"AC Power");
    payload.extend_from_slice(&[0x0B, 0x00, 0x00, 0x00]); // 0.0 W

    let transport = MockTransport::respond_with(vec![Ok(telegram(0x41, 0x29, &payload))]);
    let mut c = coordinator(transport);

    let reading = c
        .request_metric("CURRENT_ELECTRICITY_DELIVERY")
        .await
        .unwrap()
        .expect("0.0 W is a real reading");
    assert_eq!(reading.value, DecodedValue::Float(0.0, Unit::Watt));
}

#[tokio::test]
async fn nul_unit_means_no_reading() {
    let mut payload = vec![0x00, 0x00, 0x08];
    payload.extend_from_slice(b"AC Power");
    payload.extend_from_slice(&packed_one(0x00)); // unit tag NUL

    let transport = MockTransport::respond_with(vec![Ok(telegram(0x41, 0x29, &payload))]);
    let mut c = coordinator(transport);

    let reading = c.request_metric("CURRENT_ELECTRICITY_DELIVERY").await.unwrap();
    assert_eq!(reading, None);
}

#[tokio::test]
async fn framing_failure_means_no_data_not_an_error() {
    let transport = MockTransport::respond_with(vec![Ok(vec![0xDE, 0xAD, 0xBE, 0xEF])]);
    let mut c = coordinator(transport);

    let reading = c.request_metric("ELECTRICITY_EXPORTED_TOTAL").await.unwrap();
    assert_eq!(reading, None);
}

#[tokio::test]
async fn transport_timeout_means_no_data_not_an_error() {
    let transport = MockTransport::respond_with(vec![Err(anyhow!("no response within 1s"))]);
    let mut c = coordinator(transport);

    let reading = c.request_metric("ELECTRICITY_EXPORTED_TOTAL").await.unwrap();
    assert_eq!(reading, None);
}
