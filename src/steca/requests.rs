use crate::prelude::*;

// Request telegrams recorded from a StecaGrid SEM (id 0x7b) polling a
// StecaGrid 3600 (id 1), replayed verbatim. The crc trailers are the
// captured ones; we never recompute them.
pub const SG_NOMINAL_POWER: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x40, 0x03, 0x00, 0x01, 0x1d, 0x72, 0x30, 0x95, 0x03,
];
pub const SG_PANEL_POWER: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x40, 0x03, 0x00, 0x01, 0x22, 0x77, 0x12, 0xee, 0x03,
];
pub const SG_PANEL_VOLTAGE: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x40, 0x03, 0x00, 0x01, 0x23, 0x78, 0x78, 0xe4, 0x03,
];
pub const SG_PANEL_CURRENT: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x40, 0x03, 0x00, 0x01, 0x24, 0x79, 0xa0, 0xb6, 0x03,
];
pub const SG_VERSIONS: [u8; 12] = [
    0x02, 0x01, 0x00, 0x0c, 0x01, 0x7b, 0xc6, 0x20, 0x03, 0x79, 0x8c, 0x03,
];
pub const SG_SERIAL: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x64, 0x03, 0x00, 0x01, 0x09, 0x5e, 0x85, 0x6e, 0x03,
];
pub const SG_TIME: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x64, 0x03, 0x00, 0x01, 0x05, 0x5a, 0x3a, 0x44, 0x03,
];
pub const SG_DAILY_YIELD: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x40, 0x03, 0x00, 0x01, 0x3c, 0x91, 0xe1, 0xc9, 0x03,
];
pub const SG_TOTAL_YIELD: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x64, 0x03, 0x00, 0x01, 0xf1, 0x46, 0xcc, 0x79, 0x03,
];
pub const SG_AC_POWER: [u8; 16] = [
    0x02, 0x01, 0x00, 0x10, 0x01, 0x7b, 0xb5, 0x40, 0x03, 0x00, 0x01, 0x29, 0x7e, 0x98, 0x5b, 0x03,
];

/// The lifetime export counter; a zero reading from it is a decode or
/// transport fault, never a real meter reset, and must not be published.
pub const TOTAL_EXPORT_METRIC: &str = "ELECTRICITY_EXPORTED_TOTAL";

/// Map an OBIS-style metric name to the request telegram that elicits
/// its response. Static configuration data, initialised once.
pub fn request_for(metric: &str) -> Option<&'static [u8]> {
    let r: &'static [u8] = match metric {
        "ELECTRICITY_EXPORTED_TOTAL" => &SG_TOTAL_YIELD, // :2.8.0 total exported energy (P-)
        "CURRENT_ELECTRICITY_DELIVERY" => &SG_AC_POWER,  // :2.7.0
        "Q3D_EQUIPMENT_SERIALNUMBER" => &SG_SERIAL,      // :96.1.255 device serial number
        "CURRENT_PANEL_POWER" => &SG_PANEL_POWER,
        "CURRENT_PANEL_VOLTAGE" => &SG_PANEL_VOLTAGE,
        "CURRENT_PANEL_CURRENT" => &SG_PANEL_CURRENT,
        "NOMINAL_POWER" => &SG_NOMINAL_POWER,
        "DAILY_YIELD" => &SG_DAILY_YIELD,
        "DEVICE_TIME" => &SG_TIME,
        "DEVICE_VERSIONS" => &SG_VERSIONS,
        _ => return None,
    };
    Some(r)
}

/// Reject unknown metric names up front; a typo in the config should
/// fail at startup, not silently poll nothing forever.
pub fn validate_metrics(names: &[String]) -> Result<()> {
    for name in names {
        if request_for(name).is_none() {
            bail!("unknown metric in values_of_interest: {}", name);
        }
    }
    Ok(())
}
