use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use crate::protocols::sysex;
use crate::{ok_or_continue, MidiError, SurfaceEvent};

/// Something raw MIDI bytes can be written to. Writes are fire-and-forget: there's no
/// acknowledgment from the hardware, only a possible error from the driver.
pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError>;
}

impl Transport for MidiOutputConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        MidiOutputConnection::send(self, bytes)?;
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        (**self).send(bytes)
    }
}

/// Find the first port whose name contains `keyword`
pub fn guess_port<T: midir::MidiIO>(midi_io: &T, keyword: &str) -> Option<T::Port> {
    for port in midi_io.ports() {
        let name = ok_or_continue!(midi_io.port_name(&port));

        if name.contains(keyword) {
            return Some(port);
        }
    }

    None
}

/// Connect to the first output port matching `keyword`
pub fn connect_output(keyword: &str) -> Result<MidiOutputConnection, MidiError> {
    let midi_output = MidiOutput::new(crate::APPLICATION_NAME)?;

    let port = guess_port(&midi_output, keyword).ok_or_else(|| MidiError::NoPortFound {
        keyword: keyword.to_owned(),
    })?;
    let port_name = midi_output.port_name(&port)?;
    log::info!("Connecting to output port {:?}", port_name);

    Ok(midi_output.connect(&port, &format!("{} output", crate::APPLICATION_NAME))?)
}

/// Connect to the first input port matching `keyword` and forward every message into `sender`.
///
/// The connection stays open as long as the returned value lives.
#[must_use = "If not saved, the connection will be immediately dropped"]
pub fn connect_input(
    keyword: &str,
    sender: Sender<SurfaceEvent>,
) -> Result<MidiInputConnection<()>, MidiError> {
    let mut midi_input = MidiInput::new(crate::APPLICATION_NAME)?;
    midi_input.ignore(midir::Ignore::TimeAndActiveSense);

    let port = guess_port(&midi_input, keyword).ok_or_else(|| MidiError::NoPortFound {
        keyword: keyword.to_owned(),
    })?;
    let port_name = midi_input.port_name(&port)?;
    log::info!("Connecting to input port {:?}", port_name);

    let callback = move |_timestamp: u64, data: &[u8], _: &mut ()| {
        if sender.send(SurfaceEvent::Midi(data.to_vec())).is_err() {
            log::trace!("Surface is gone, dropping input {:02X?}", data);
        }
    };

    Ok(midi_input.connect(
        &port,
        &format!("{} input", crate::APPLICATION_NAME),
        callback,
        (),
    )?)
}

/// A transport that records what it's given instead of sending it anywhere. Clones share the
/// same record, so a test can keep one handle while the surface owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything sent so far, clearing the record
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Make every further send fail with [`MidiError::Disconnected`]
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MidiError::Disconnected);
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(bytes.to_vec());
        Ok(())
    }
}

/// A message in the shape hosts with a scripting API want it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostMessage {
    Short { status: u8, data1: u8, data2: u8 },
    /// Upper case hex pairs separated by spaces, including `F0` and `F7`
    Sysex(String),
}

/// Adapts to a host that takes short messages as three integers and SysEx as hex strings
pub struct HostTransport<F> {
    sink: F,
}

impl<F: FnMut(HostMessage)> HostTransport<F> {
    pub fn new(sink: F) -> Self {
        Self { sink }
    }
}

impl<F: FnMut(HostMessage)> Transport for HostTransport<F> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), MidiError> {
        let message = match *bytes {
            [] => return Ok(()),
            [sysex::SYSEX_START, ..] => HostMessage::Sysex(sysex::to_hex(bytes)),
            [status, data1, data2] => HostMessage::Short {
                status,
                data1,
                data2,
            },
            [status, data1] => HostMessage::Short {
                status,
                data1,
                data2: 0,
            },
            [status] => HostMessage::Short {
                status,
                data1: 0,
                data2: 0,
            },
            _ => {
                log::error!("Can't hand {:02X?} to the host, it's neither short nor SysEx", bytes);
                return Ok(());
            }
        };
        (self.sink)(message);
        Ok(())
    }
}
