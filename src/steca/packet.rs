use crate::prelude::*;
use crate::steca::value::{self, Unit};

use chrono::{NaiveDate, NaiveDateTime};
use num_enum::{FromPrimitive, IntoPrimitive};

pub const START_MARKER: u8 = 0x02;
pub const END_MARKER: u8 = 0x03;

// Telegram layout, start to end marker inclusive:
//   [0] start, [1] unknown, [2..4] total length (BE), [4] to, [5] from,
//   [6] crc1, [7] class, [8..] payload, [len-3..len-1] crc2, [len-1] end.
// The trailing crc bytes are located but never verified; nothing we have
// captured tells us the algorithm, so we carry the gap forward.
const CLASS_OFFSET: usize = 7;
const SECONDARY_OFFSET: usize = 8;
const SUB_CODE_OFFSET: usize = 11;

// MessageClass {{{
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum MessageClass {
    VersionResponse = 0x21,
    RequestA = 0x40,
    ResponseA = 0x41,
    RequestB = 0x64,
    ResponseB = 0x65,
    #[num_enum(default)]
    Unknown = 0x00,
}
// }}}

// Sub-codes seen in RequestA/ResponseA telegrams. Anything else falls
// through to the generic labelled record; the protocol is only partly
// reverse-engineered and unknowns must degrade, not abort.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum MeasurementCode {
    NominalPower = 0x1D,
    PanelPower = 0x22,
    PanelVoltage = 0x23,
    PanelCurrent = 0x24,
    AcPower = 0x29,
    DailyYield = 0x3C,
    LabelBlock = 0x51,
    #[num_enum(default)]
    Other = 0x00,
}

impl MeasurementCode {
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementCode::NominalPower => "Nominal Power",
            MeasurementCode::PanelPower => "Panel Power",
            MeasurementCode::PanelVoltage => "Panel Voltage",
            MeasurementCode::PanelCurrent => "Panel Current",
            MeasurementCode::AcPower => "AC Power",
            MeasurementCode::DailyYield => "Daily Yield",
            MeasurementCode::LabelBlock => "Label Block",
            MeasurementCode::Other => "Unknown",
        }
    }
}

// Sub-codes seen in RequestB/ResponseB telegrams.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum RegisterCode {
    Time = 0x05,
    Status = 0x08,
    SerialNumber = 0x09,
    TotalYield = 0xF1,
    #[num_enum(default)]
    Other = 0x00,
}

// DecodedValue {{{
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedValue {
    Float(f32, Unit),
    Text(String),
    Timestamp(NaiveDateTime),
    Raw(String),
}

impl DecodedValue {
    pub fn unit(&self) -> Option<Unit> {
        match self {
            DecodedValue::Float(_, unit) => Some(*unit),
            _ => None,
        }
    }

    /// Wire payload for the telemetry bus.
    pub fn payload(&self) -> Result<String> {
        let r = match self {
            DecodedValue::Float(v, _) => serde_json::to_string(v)?,
            DecodedValue::Text(s) => s.clone(),
            DecodedValue::Timestamp(t) => t.to_string(),
            DecodedValue::Raw(hex) => hex.clone(),
        };
        Ok(r)
    }
}

impl std::fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodedValue::Float(v, unit) => write!(f, "{:0.2} {}", v, unit),
            DecodedValue::Text(s) => write!(f, "{}", s),
            DecodedValue::Timestamp(t) => write!(f, "{}", t),
            DecodedValue::Raw(hex) => write!(f, "{}", hex),
        }
    }
}
// }}}

/// One labelled measurement decoded out of a telegram.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub label: String,
    pub value: DecodedValue,
}

impl Reading {
    fn new(label: impl Into<String>, value: DecodedValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Structural check that a buffer is exactly one well-formed telegram:
/// start marker, end marker, and the declared length matching the
/// actual byte count. The crc trailer is not verified.
pub fn validate(t: &[u8]) -> bool {
    if t.len() < 4 {
        return false;
    }
    if t[0] != START_MARKER {
        return false;
    }
    if t[t.len() - 1] != END_MARKER {
        return false;
    }
    t.len() == ((t[2] as usize) << 8 | t[3] as usize)
}

/// Format bytes as the usual lowercase hex dump, eg "02 01 00 10".
pub fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn slice4(t: &[u8], offset: usize) -> Option<[u8; 4]> {
    t.get(offset..offset + 4)?.try_into().ok()
}

/// Route one validated telegram to its field layout and decode it into
/// zero or more labelled readings. Callers must run [`validate`] first;
/// short or garbled payloads inside a structurally valid telegram still
/// degrade to fewer readings rather than panicking.
pub fn dispatch(t: &[u8]) -> Vec<Reading> {
    let mut readings = Vec::new();

    if t.len() <= SUB_CODE_OFFSET {
        return readings;
    }

    let sub_code = t[SUB_CODE_OFFSET];
    match MessageClass::from(t[CLASS_OFFSET]) {
        MessageClass::RequestA => {
            debug!(
                "request for 0x{:02x} ({}) from {}",
                sub_code,
                MeasurementCode::from(sub_code).label(),
                t[4]
            );
        }
        MessageClass::ResponseA if t[SECONDARY_OFFSET] == 0x00 => {
            dispatch_measurement(t, sub_code, &mut readings);
        }
        MessageClass::RequestB => {
            debug!("register request for 0x{:02x} from {}", sub_code, t[4]);
        }
        MessageClass::ResponseB => {
            dispatch_register(t, sub_code, &mut readings);
        }
        MessageClass::VersionResponse if t[SECONDARY_OFFSET] == 0x00 => {
            if let Some(block) = t.get(SUB_CODE_OFFSET..t.len() - 3) {
                readings.push(Reading::new(
                    "Versions",
                    DecodedValue::Text(value::decode_version_block(block)),
                ));
            }
        }
        _ => {}
    }

    readings
}

// ResponseA: measurement records carrying packed floats.
fn dispatch_measurement(t: &[u8], sub_code: u8, readings: &mut Vec<Reading>) {
    match MeasurementCode::from(sub_code) {
        MeasurementCode::LabelBlock => {
            // Two records of ascii label + four packed floats. The
            // second one starts three bytes after the first one ends.
            if let Some(end) = label_block(t, 15, readings) {
                label_block(t, end + 3, readings);
            }
        }
        MeasurementCode::DailyYield => {
            if let Some(bytes) = slice4(t, 12) {
                let (v, unit) = value::decode_packed_float(&bytes);
                readings.push(Reading::new("Daily Yield", DecodedValue::Float(v, unit)));
            }
        }
        _ => {
            // Generic record: one-byte label length at 14, ascii label
            // at 15, packed float immediately after the label.
            let Some(&label_len) = t.get(14) else { return };
            let value_at = 15 + label_len as usize;
            let (Some(label), Some(bytes)) = (t.get(15..value_at), slice4(t, value_at))
            else {
                return;
            };
            let (v, unit) = value::decode_packed_float(&bytes);
            readings.push(Reading::new(
                String::from_utf8_lossy(label),
                DecodedValue::Float(v, unit),
            ));
        }
    }
}

// One label-block record: two-byte BE label length at offset-2, ascii
// label, then four packed floats. Returns the offset just past the
// record. The length-field position is inferred from captured traces
// and has not been exercised with long labels.
fn label_block(t: &[u8], label_at: usize, readings: &mut Vec<Reading>) -> Option<usize> {
    let len_hi = *t.get(label_at.checked_sub(2)?)? as usize;
    let len_lo = *t.get(label_at - 1)? as usize;
    let value_at = label_at + (len_hi << 8 | len_lo);

    let label = String::from_utf8_lossy(t.get(label_at..value_at)?).into_owned();
    for i in 0..4 {
        let bytes = slice4(t, value_at + i * 4)?;
        let (v, unit) = value::decode_packed_float(&bytes);
        readings.push(Reading::new(label.clone(), DecodedValue::Float(v, unit)));
    }

    Some(value_at + 16)
}

// ResponseB: registers with their own one-off encodings.
fn dispatch_register(t: &[u8], sub_code: u8, readings: &mut Vec<Reading>) {
    match RegisterCode::from(sub_code) {
        RegisterCode::TotalYield => {
            // Little-endian float, not the packed encoding.
            if let Some(bytes) = slice4(t, 12) {
                readings.push(Reading::new(
                    "Total Yield",
                    DecodedValue::Float(value::decode_total_yield_float(&bytes), Unit::WattHour),
                ));
            }
        }
        RegisterCode::Time => {
            // Six bytes: year-2000, month, day, hour, minute, second.
            // The record has three more bytes (timezone? millis?) that
            // we deliberately ignore.
            let Some(b) = t.get(12..18) else { return };
            let timestamp = NaiveDate::from_ymd_opt(2000 + b[0] as i32, b[1] as u32, b[2] as u32)
                .and_then(|d| d.and_hms_opt(b[3] as u32, b[4] as u32, b[5] as u32));
            match timestamp {
                Some(ts) => readings.push(Reading::new("Time", DecodedValue::Timestamp(ts))),
                None => readings.push(Reading::new(
                    "Time",
                    DecodedValue::Raw(hex_string(b)),
                )),
            }
        }
        RegisterCode::SerialNumber => {
            let Some(ascii) = t.get(12..t.len().saturating_sub(4)) else {
                return;
            };
            readings.push(Reading::new(
                "Serial Number",
                DecodedValue::Text(String::from_utf8_lossy(ascii).into_owned()),
            ));
        }
        _ => {
            // RegisterCode::Status and anything unrecognised: dump the
            // first five payload bytes as hex so nothing is lost.
            if let Some(bytes) = t.get(12..17.min(t.len())) {
                readings.push(Reading::new("???", DecodedValue::Raw(hex_string(bytes))));
            }
        }
    }
}
