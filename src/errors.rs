#[derive(Debug)]
pub enum MidiError {
    InputConnectError(midir::ConnectError<midir::MidiInput>),
    OutputConnectError(midir::ConnectError<midir::MidiOutput>),
    InitError(midir::InitError),
    PortInfoError(midir::PortInfoError),
    SendError(midir::SendError),
    NoPortFound {
        // The keyword that was searched for
        keyword: String,
    },
    /// The transport was closed, e.g. after shutdown
    Disconnected,
}

impl std::fmt::Display for MidiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputConnectError(_) => f.write_str("connecting to MIDI input port failed"),
            Self::OutputConnectError(_) => f.write_str("connecting to MIDI output port failed"),
            Self::InitError(_) => f.write_str("MIDI context initialization failed"),
            Self::PortInfoError(_) => f.write_str("MIDI Port retrieval failed"),
            Self::SendError(_) => f.write_str("sending MIDI message failed"),
            Self::NoPortFound { keyword } => write!(f, "couldn't find a port for {:?}", keyword),
            Self::Disconnected => f.write_str("MIDI transport is disconnected"),
        }
    }
}

impl std::error::Error for MidiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InputConnectError(e) => Some(e),
            Self::OutputConnectError(e) => Some(e),
            Self::InitError(e) => Some(e),
            Self::PortInfoError(e) => Some(e),
            Self::SendError(e) => Some(e),
            Self::NoPortFound { keyword: _ } => None,
            Self::Disconnected => None,
        }
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for MidiError {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Self::InputConnectError(e)
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for MidiError {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Self::OutputConnectError(e)
    }
}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        Self::InitError(e)
    }
}

impl From<midir::PortInfoError> for MidiError {
    fn from(e: midir::PortInfoError) -> Self {
        Self::PortInfoError(e)
    }
}

impl From<midir::SendError> for MidiError {
    fn from(e: midir::SendError) -> Self {
        Self::SendError(e)
    }
}

/// Problems with a hardware definition. These are found by the `validate()` functions of the
/// configuration types, normally once at startup or in a unit test. At runtime the engine never
/// propagates them; it logs and falls back to "off" instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `to_logical(to_hardware(index))` didn't give back `index`
    RoundTrip { index: u8, got: Option<u8> },
    /// An index inside the declared range has no hardware address
    Unmapped { index: u8 },
    /// Two controls share the same hardware address
    DuplicateAddress { channel: u8, code: u8 },
    /// The display tile table is not a permutation of its bit positions
    InvalidTile { position: usize },
    /// A SysEx header or payload byte has its high bit set
    NotSevenBit { byte: u8 },
    /// A hex string couldn't be parsed
    InvalidHex { text: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundTrip { index, got } => write!(
                f,
                "pad {} doesn't survive the hardware round trip (came back as {:?})",
                index, got
            ),
            Self::Unmapped { index } => write!(f, "pad {} has no hardware address", index),
            Self::DuplicateAddress { channel, code } => write!(
                f,
                "hardware address (channel {}, code {}) is used twice",
                channel, code
            ),
            Self::InvalidTile { position } => {
                write!(f, "tile bit position {} is mapped zero or multiple times", position)
            }
            Self::NotSevenBit { byte } => write!(f, "byte {:#04x} is not a MIDI data byte", byte),
            Self::InvalidHex { text } => write!(f, "invalid hex string {:?}", text),
        }
    }
}

impl std::error::Error for ConfigError {}
