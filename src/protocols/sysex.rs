//! System Exclusive framing helpers

use crate::ConfigError;

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Universal non-realtime identity request, sent to every device id
pub const IDENTITY_REQUEST: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];

/// Whether the byte may appear inside a SysEx message (high bit clear)
pub fn is_data_byte(byte: u8) -> bool {
    byte & 0x80 == 0
}

/// Check that all bytes are 7-bit data bytes
pub fn check_data(bytes: &[u8]) -> Result<(), ConfigError> {
    match bytes.iter().find(|&&byte| !is_data_byte(byte)) {
        Some(&byte) => Err(ConfigError::NotSevenBit { byte }),
        None => Ok(()),
    }
}

/// Check a device header: `F0` followed by data bytes only
pub fn check_header(header: &[u8]) -> Result<(), ConfigError> {
    match header.split_first() {
        Some((&SYSEX_START, rest)) => check_data(rest),
        Some((&byte, _)) => Err(ConfigError::NotSevenBit { byte }),
        None => Err(ConfigError::NotSevenBit { byte: 0 }),
    }
}

/// Split a length into two 7-bit bytes, most significant first
pub fn length_14bit(length: usize) -> [u8; 2] {
    debug_assert!(length < 1 << 14, "length {} doesn't fit into 14 bits", length);
    [((length >> 7) & 0x7F) as u8, (length & 0x7F) as u8]
}

/// Assemble `header, command, payload, F7`. `header` starts with `F0`.
pub fn frame(header: &[u8], command: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(header.len() + payload.len() + 2);
    bytes.extend_from_slice(header);
    bytes.push(command);
    bytes.extend_from_slice(payload);
    bytes.push(SYSEX_END);
    bytes
}

/// Format bytes the way hosts with a string based SysEx API expect them: upper case hex pairs
/// separated by spaces.
///
/// ```
/// # use surfacekit::protocols::sysex::to_hex;
/// assert_eq!(to_hex(&[0xF0, 0x47, 0x7F, 0xF7]), "F0 47 7F F7");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(&format!("{:02X}", byte));
    }
    text
}

/// Parse hex pairs, with or without whitespace between them
pub fn from_hex(text: &str) -> Result<Vec<u8>, ConfigError> {
    let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let invalid = || ConfigError::InvalidHex {
        text: text.to_owned(),
    };

    if digits.len() % 2 != 0 {
        return Err(invalid());
    }

    digits
        .chunks(2)
        .map(|pair| {
            let high = pair[0].to_digit(16).ok_or_else(invalid)?;
            let low = pair[1].to_digit(16).ok_or_else(invalid)?;
            Ok((high * 16 + low) as u8)
        })
        .collect()
}
