//! Universal device inquiry, used to log which hardware actually answered on a port

use crate::{MidiError, Transport};

/// Used for the Device Inquiry message
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DeviceIdQuery {
    /// Send the Device Inquiry request to a specific device id
    Specific(u8),
    /// Send the Device Inquiry request to all devices
    Any,
}

/// A parsed identity reply
#[derive(Debug, Eq, PartialEq, Hash, Clone)]
pub struct DeviceInquiry {
    pub device_id: u8,
    /// One byte ids are stored as is, extended ids (starting with `00`) as all three bytes
    pub manufacturer: Vec<u8>,
    pub family_code: u16,
    pub family_member_code: u16,
    /// Four raw bytes; each manufacturer formats these differently
    pub firmware_revision: [u8; 4],
}

const QUERY_DEVICE_ID_FOR_ANY: u8 = 127;

pub fn device_inquiry_message(query: DeviceIdQuery) -> [u8; 6] {
    let query_device_id = match query {
        DeviceIdQuery::Specific(device_id) if device_id < QUERY_DEVICE_ID_FOR_ANY => device_id,
        DeviceIdQuery::Specific(device_id) => {
            log::warn!("Device id {} is out of range, asking everyone instead", device_id);
            QUERY_DEVICE_ID_FOR_ANY
        }
        DeviceIdQuery::Any => QUERY_DEVICE_ID_FOR_ANY,
    };

    [240, 126, query_device_id, 6, 1, 247]
}

pub fn request_device_inquiry(
    output: &mut dyn Transport,
    query: DeviceIdQuery,
) -> Result<(), MidiError> {
    output.send(&device_inquiry_message(query))
}

pub fn parse_device_query(data: &[u8]) -> Option<DeviceInquiry> {
    let (device_id, rest) = match data {
        [240, 126, device_id, 6, 2, rest @ ..] => (*device_id, rest),
        _ => return None,
    };

    let (manufacturer, rest) = match rest {
        [0, a, b, rest @ ..] => (vec![0, *a, *b], rest),
        [id, rest @ ..] => (vec![*id], rest),
        [] => return None,
    };

    if let &[fc1, fc2, fmc1, fmc2, fr1, fr2, fr3, fr4, 247] = rest {
        Some(DeviceInquiry {
            device_id,
            manufacturer,
            family_code: u16::from_be_bytes([fc1, fc2]),
            family_member_code: u16::from_be_bytes([fmc1, fmc2]),
            firmware_revision: [fr1, fr2, fr3, fr4],
        })
    } else {
        None
    }
}
