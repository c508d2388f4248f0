use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{Bitmap, StripeEncoder, StripeLayout};

#[derive(Debug)]
struct DisplayState {
    bitmap: Bitmap,
    encoder: StripeEncoder,
}

/// A display buffer plus its stripe encoder behind one lock.
///
/// Cloning gives another handle to the same display, so whoever renders can draw while the
/// runtime's keep-alive tick flushes. Both the pixels and the last-sent comparison data live under
/// the same lock, so a flush never sees a half-drawn frame.
#[derive(Debug, Clone)]
pub struct SharedDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl SharedDisplay {
    pub fn new(layout: StripeLayout) -> Self {
        let bitmap = layout.bitmap();
        Self {
            state: Arc::new(Mutex::new(DisplayState {
                bitmap,
                encoder: StripeEncoder::new(layout),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DisplayState> {
        // A panic while drawing leaves at worst a garbled picture, which the next draw fixes
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layout(&self) -> StripeLayout {
        self.lock().encoder.layout().clone()
    }

    /// Draw on the display buffer. The lock is held for the duration of `f`.
    pub fn draw<R>(&self, f: impl FnOnce(&mut Bitmap) -> R) -> R {
        f(&mut self.lock().bitmap)
    }

    pub fn clear(&self) {
        self.lock().bitmap.clear();
    }

    pub fn set_refresh_margin(&self, margin: Duration) {
        self.lock().encoder.set_refresh_margin(margin);
    }

    pub fn invalidate(&self) {
        self.lock().encoder.invalidate();
    }

    /// The frames that need sending right now
    pub fn take_frames(&self, now: Instant) -> Vec<Vec<u8>> {
        let mut state = self.lock();
        let DisplayState { bitmap, encoder } = &mut *state;
        encoder.update(bitmap, now)
    }
}
