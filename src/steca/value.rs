use std::fmt;

/// Physical unit of a measurement, taken from the tag byte that
/// prefixes every packed float on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unit {
    Watt,
    Amp,
    Volt,
    Hertz,
    WattHour,
    /// Tag byte 0x00; the inverter sends this when it has no reading.
    None,
    /// Tag byte we have not seen documented anywhere yet.
    UnknownTag(u8),
}

impl Unit {
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0x0B => Unit::Watt,
            0x07 => Unit::Amp,
            0x05 => Unit::Volt,
            0x0D => Unit::Hertz,
            0x09 => Unit::WattHour,
            0x00 => Unit::None,
            other => Unit::UnknownTag(other),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Watt => write!(f, "W"),
            Unit::Amp => write!(f, "A"),
            Unit::Volt => write!(f, "V"),
            Unit::Hertz => write!(f, "Hz"),
            Unit::WattHour => write!(f, "Wh"),
            Unit::None => write!(f, "NUL"),
            Unit::UnknownTag(tag) => write!(f, "0x{:02x}", tag),
        }
    }
}

/// Decode Steca's packed float format: a unit tag byte followed by a
/// 32-bit word stored in the order `b3, b1, b2` and left-shifted by 7.
///
/// The byte interleave and the shift are the vendor's own encoding,
/// worked out from captured traffic. Reordering or changing the shift
/// decodes every magnitude wrong, so keep this bit-exact.
pub fn decode_packed_float(bytes: &[u8; 4]) -> (f32, Unit) {
    let unit = Unit::from_tag(bytes[0]);
    let word =
        (((bytes[3] as u32) << 8 | bytes[1] as u32) << 8 | bytes[2] as u32) << 7;
    (f32::from_bits(word), unit)
}

/// The total-yield register uses a plain little-endian IEEE-754
/// binary32, unlike every other float the inverter sends.
pub fn decode_total_yield_float(bytes: &[u8; 4]) -> f32 {
    f32::from_bits(u32::from_le_bytes(*bytes))
}

/// Field class template for the firmware/version report. `S` is a
/// zero-terminated string, `N` a six-numeric-byte group reported as a
/// dotted triplet, `X` a group that is skipped once longer than one.
const VERSION_TEMPLATE: &[u8] =
    b"SSXSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSNSSSSSSSSSSSS";

fn template_class(field_index: usize) -> u8 {
    // Inputs longer than the template would run off the end; treat the
    // overflow as more string fields rather than panicking.
    VERSION_TEMPLATE
        .get(field_index)
        .copied()
        .unwrap_or(b'S')
}

/// Decode the fixed-format firmware/version report.
///
/// This is a per-byte accumulator: the state is the index of the
/// current template field plus the pending element buffer. A field
/// closes when its class condition is met, and the byte that closed it
/// still lands in the next field, exactly as the device formats it.
pub fn decode_version_block(bytes: &[u8]) -> String {
    let mut fields: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for &b in bytes {
        match template_class(fields.len()) {
            b'S' if b == 0 => {
                fields.push(pending.concat());
                pending.clear();
            }
            b'N' if pending.len() > 6 => {
                fields.push(pending[2..=4].join("."));
                pending.clear();
            }
            b'X' if pending.len() > 1 => {
                fields.push(String::new());
                pending.clear();
            }
            _ => {}
        }

        match template_class(fields.len()) {
            b'S' => pending.push((b as char).to_string()),
            _ => pending.push(b.to_string()),
        }
    }

    join_version_fields(&fields)
}

/// Join decoded version fields with the report's separator pattern:
/// newline after fields 0-3 and after every field where
/// `(index - 4) % 3 == 1`, tab otherwise.
pub fn join_version_fields(fields: &[String]) -> String {
    let mut s = String::new();
    for (i, field) in fields.iter().enumerate() {
        s.push_str(field);
        if i < 4 || (i - 4) % 3 == 1 {
            s.push('\n');
        } else {
            s.push('\t');
        }
    }
    s
}
