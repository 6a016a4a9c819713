#![allow(dead_code)] // not every test binary uses every helper

/// Build a structurally valid telegram around a payload: start/end
/// markers, filled-in length field, class byte at 7, sub-code at 11,
/// payload from offset 12, and a dummy (unverified) crc trailer.
pub fn telegram(class: u8, sub: u8, payload: &[u8]) -> Vec<u8> {
    let mut t = vec![
        0x02, 0x01, 0x00, 0x00, 0x01, 0x7b, 0x00, class, 0x00, 0x00, 0x00, sub,
    ];
    t.extend_from_slice(payload);
    t.extend_from_slice(&[0x00, 0x00, 0x03]);

    let len = t.len() as u16;
    t[2] = (len >> 8) as u8;
    t[3] = (len & 0xff) as u8;
    t
}

/// Packed-float wire bytes for 1.0 with the given unit tag.
/// 1.0f32 = 0x3F800000; >> 7 = 0x7F0000 = b3 0x7F, b1 0x00, b2 0x00.
pub fn packed_one(unit_tag: u8) -> [u8; 4] {
    [unit_tag, 0x00, 0x00, 0x7F]
}
