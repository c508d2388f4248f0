//! The bytes that go over the wire: SysEx framing, pad LED updates and the device inquiry

pub mod pad_lights;
pub mod query;
pub mod sysex;

pub use pad_lights::*;
pub use query::*;
