use std::borrow::Cow;
use std::time::{Duration, Instant};

use super::Bitmap;
use crate::protocols::sysex;
use crate::ConfigError;

/// Bits carried by each SysEx data byte
const BITS_PER_BYTE: usize = 7;

/// The bit-to-pixel permutation inside one tile of a stripe.
///
/// `sources[t]` is the `(x, y)` offset within the tile of the pixel that ends up at destination
/// bit `t`. Tiles are laid out left to right across the stripe; destination bit `b` of a stripe
/// belongs to tile `b / bits()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilePermutation {
    pub width: u8,
    /// Also the height of a stripe
    pub height: u8,
    pub sources: Cow<'static, [(u8, u8)]>,
}

impl TilePermutation {
    /// Row-major tile without any shuffling
    pub fn identity(width: u8, height: u8) -> Self {
        let sources = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .collect::<Vec<_>>();
        Self {
            width,
            height,
            sources: Cow::Owned(sources),
        }
    }

    pub fn bits(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that every pixel of the tile is used by exactly one destination bit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bits() == 0 || self.sources.len() != self.bits() {
            return Err(ConfigError::InvalidTile {
                position: self.sources.len(),
            });
        }

        let mut seen = vec![false; self.bits()];
        for (position, &(x, y)) in self.sources.iter().enumerate() {
            if x >= self.width || y >= self.height {
                return Err(ConfigError::InvalidTile { position });
            }
            let pixel = y as usize * self.width as usize + x as usize;
            if std::mem::replace(&mut seen[pixel], true) {
                return Err(ConfigError::InvalidTile { position });
            }
        }
        Ok(())
    }
}

/// Describes a display whose memory is split into horizontal stripes that are sent one SysEx
/// message each.
///
/// Each stripe message looks like this:
///
/// `header, command, length (14 bit), stripe, stripe, 0, width - 1, payload, F7`
///
/// where the length counts the four addressing bytes plus the payload, and the payload packs the
/// stripe's pixels seven to a byte, least significant bit first, in the order given by
/// [`TilePermutation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StripeLayout {
    pub width: usize,
    pub stripes: usize,
    pub tile: TilePermutation,
    /// Starts with `F0`
    pub header: Cow<'static, [u8]>,
    pub command: u8,
    /// Stripes that weren't sent for this long are sent again even if unchanged, because the
    /// display goes to sleep otherwise
    pub keep_alive: Duration,
}

impl StripeLayout {
    pub fn stripe_height(&self) -> usize {
        self.tile.height as usize
    }

    pub fn height(&self) -> usize {
        self.stripes * self.stripe_height()
    }

    pub fn payload_len(&self) -> usize {
        (self.width * self.stripe_height() + BITS_PER_BYTE - 1) / BITS_PER_BYTE
    }

    /// A bitmap with the display's dimensions
    pub fn bitmap(&self) -> Bitmap {
        Bitmap::new(self.width, self.height())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tile.validate()?;
        sysex::check_header(&self.header)?;
        sysex::check_data(&[self.command])?;
        // Stripe numbers and the last column are sent as data bytes
        if self.stripes > 128 {
            return Err(ConfigError::NotSevenBit {
                byte: self.stripes as u8,
            });
        }
        if self.width == 0 || self.width > 128 {
            return Err(ConfigError::NotSevenBit {
                byte: self.width.wrapping_sub(1) as u8,
            });
        }
        Ok(())
    }

    /// Pack one stripe of the bitmap. Pixels outside the bitmap count as dark. A partial last tile
    /// only gets the destination bits that fit into the payload, so its tile table has to put the
    /// columns that exist first.
    pub fn encode_stripe(&self, bitmap: &Bitmap, stripe: usize) -> Vec<u8> {
        let mut payload = vec![0u8; self.payload_len()];
        let tile_bits = self.tile.bits();
        if tile_bits == 0 || self.tile.sources.len() < tile_bits {
            log::error!("Display tile table is broken, sending a blank stripe");
            return payload;
        }

        let top = stripe * self.stripe_height();
        for bit in 0..payload.len() * BITS_PER_BYTE {
            let (tile_x, tile_y) = self.tile.sources[bit % tile_bits];
            let x = (bit / tile_bits) * self.tile.width as usize + tile_x as usize;
            if x < self.width && bitmap.get(x, top + tile_y as usize) {
                payload[bit / BITS_PER_BYTE] |= 1 << (bit % BITS_PER_BYTE);
            }
        }

        payload
    }

    /// Wrap an encoded stripe into its SysEx message
    pub fn frame(&self, stripe: usize, payload: &[u8]) -> Vec<u8> {
        let stripe = (stripe & 0x7F) as u8;
        let last_column = (self.width.saturating_sub(1) & 0x7F) as u8;

        let mut body = Vec::with_capacity(payload.len() + 6);
        body.extend_from_slice(&sysex::length_14bit(payload.len() + 4));
        body.extend_from_slice(&[stripe, stripe, 0, last_column]);
        body.extend_from_slice(payload);
        sysex::frame(&self.header, self.command, &body)
    }

    /// Frames for every stripe, unconditionally
    pub fn encode(&self, bitmap: &Bitmap) -> Vec<Vec<u8>> {
        (0..self.stripes)
            .map(|stripe| self.frame(stripe, &self.encode_stripe(bitmap, stripe)))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct SentStripe {
    payload: Vec<u8>,
    at: Instant,
}

/// Remembers what was sent for each stripe and decides which stripes need sending: those that
/// changed, and those that are about to hit the keep-alive interval.
#[derive(Debug, Clone)]
pub struct StripeEncoder {
    layout: StripeLayout,
    sent: Vec<Option<SentStripe>>,
    refresh_margin: Duration,
}

impl StripeEncoder {
    pub fn new(layout: StripeLayout) -> Self {
        Self {
            sent: vec![None; layout.stripes],
            layout,
            refresh_margin: Duration::ZERO,
        }
    }

    /// If `update` is only called every `margin`, a stripe has to be resent `margin` early so the
    /// gap between two sends never exceeds the keep-alive interval.
    pub fn set_refresh_margin(&mut self, margin: Duration) {
        self.refresh_margin = margin.min(self.layout.keep_alive);
    }

    pub fn layout(&self) -> &StripeLayout {
        &self.layout
    }

    /// Forget what was sent, so the next update sends every stripe
    pub fn invalidate(&mut self) {
        for stripe in &mut self.sent {
            *stripe = None;
        }
    }

    /// The earliest point at which a stripe will be due for its keep-alive resend
    pub fn next_deadline(&self) -> Option<Instant> {
        let threshold = self.layout.keep_alive - self.refresh_margin;
        self.sent
            .iter()
            .flatten()
            .map(|sent| sent.at + threshold)
            .min()
    }

    /// Frames for all stripes that changed or are due for keep-alive, recording them as sent at
    /// `now`.
    pub fn update(&mut self, bitmap: &Bitmap, now: Instant) -> Vec<Vec<u8>> {
        let threshold = self.layout.keep_alive - self.refresh_margin;
        let mut frames = Vec::new();

        for stripe in 0..self.layout.stripes {
            let payload = self.layout.encode_stripe(bitmap, stripe);
            let due = match &self.sent[stripe] {
                None => true,
                Some(sent) => {
                    sent.payload != payload || now.saturating_duration_since(sent.at) >= threshold
                }
            };

            if due {
                frames.push(self.layout.frame(stripe, &payload));
                self.sent[stripe] = Some(SentStripe { payload, at: now });
            }
        }

        if !frames.is_empty() {
            log::trace!("Sending {} display stripes", frames.len());
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::fire;

    fn small_layout() -> StripeLayout {
        StripeLayout {
            width: 14,
            stripes: 2,
            ..fire::display_layout()
        }
    }

    fn decode(layout: &StripeLayout, payload: &[u8], stripe: usize, into: &mut Bitmap) {
        let tile_bits = layout.tile.bits();
        for bit in 0..payload.len() * BITS_PER_BYTE {
            let (tile_x, tile_y) = layout.tile.sources[bit % tile_bits];
            let x = (bit / tile_bits) * layout.tile.width as usize + tile_x as usize;
            if payload[bit / BITS_PER_BYTE] & (1 << (bit % BITS_PER_BYTE)) != 0 {
                into.set(x, stripe * layout.stripe_height() + tile_y as usize, true);
            }
        }
    }

    #[test]
    fn blank_bitmap_gives_blank_stripes() {
        let layout = fire::display_layout();
        let frames = layout.encode(&Bitmap::new(16, 16));
        assert_eq!(frames.len(), 8);

        for (stripe, frame) in frames.iter().enumerate() {
            let stripe = stripe as u8;
            assert_eq!(
                frame[..11],
                [0xF0, 0x47, 0x7F, 0x43, 0x0E, 1, 23, stripe, stripe, 0x00, 0x7F]
            );
            assert_eq!(frame.len(), 11 + 147 + 1);
            assert!(frame[11..158].iter().all(|&byte| byte == 0));
            assert_eq!(frame.last(), Some(&0xF7));
        }
    }

    #[test]
    fn top_left_pixel() {
        let layout = fire::display_layout();
        let mut bitmap = layout.bitmap();
        bitmap.set(0, 0, true);

        // (0, 0) is destination bit 13: byte 1, bit 6
        let payload = layout.encode_stripe(&bitmap, 0);
        assert_eq!(payload[1], 1 << 6);
        assert_eq!(payload.iter().filter(|&&byte| byte != 0).count(), 1);
        assert!(layout.encode_stripe(&bitmap, 1).iter().all(|&byte| byte == 0));
    }

    #[test]
    fn random_bitmaps_survive_packing() {
        use nanorand::Rng as _;
        let mut rng = nanorand::WyRand::new_seed(7);
        let layout = small_layout();

        for _ in 0..20 {
            let mut bitmap = layout.bitmap();
            for y in 0..bitmap.height() {
                for x in 0..bitmap.width() {
                    bitmap.set(x, y, rng.generate_range(0..2u8) == 1);
                }
            }

            let mut decoded = layout.bitmap();
            for stripe in 0..layout.stripes {
                decode(&layout, &layout.encode_stripe(&bitmap, stripe), stripe, &mut decoded);
            }
            assert_eq!(decoded, bitmap);
        }
    }

    #[test]
    fn full_width_bitmaps_survive_packing() {
        use nanorand::Rng as _;
        let mut rng = nanorand::WyRand::new_seed(128);
        let layout = fire::display_layout();

        for _ in 0..5 {
            let mut bitmap = layout.bitmap();
            for y in 0..bitmap.height() {
                for x in 0..bitmap.width() {
                    bitmap.set(x, y, rng.generate_range(0..2u8) == 1);
                }
            }
            // The partial last tile holds columns 126 and 127
            bitmap.set(127, 0, true);
            bitmap.set(126, 63, true);

            let mut decoded = layout.bitmap();
            for stripe in 0..layout.stripes {
                decode(&layout, &layout.encode_stripe(&bitmap, stripe), stripe, &mut decoded);
            }
            assert_eq!(decoded, bitmap);
        }
    }

    #[test]
    fn tile_tables_are_checked() {
        assert_eq!(fire::display_layout().validate(), Ok(()));
        assert_eq!(TilePermutation::identity(7, 8).validate(), Ok(()));

        let mut broken = TilePermutation::identity(2, 2);
        broken.sources.to_mut()[3] = (0, 0);
        assert_eq!(broken.validate(), Err(ConfigError::InvalidTile { position: 3 }));

        let mut short = TilePermutation::identity(2, 2);
        short.sources.to_mut().pop();
        assert_eq!(short.validate(), Err(ConfigError::InvalidTile { position: 3 }));
    }

    #[test]
    fn only_changed_stripes_are_resent() {
        let layout = fire::display_layout();
        let mut encoder = StripeEncoder::new(layout.clone());
        let mut bitmap = layout.bitmap();
        let start = Instant::now();

        assert_eq!(encoder.update(&bitmap, start).len(), 8);
        assert!(encoder.update(&bitmap, start).is_empty());

        bitmap.set(5, 20, true);
        let frames = encoder.update(&bitmap, start + Duration::from_millis(10));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0][7], 2);
    }

    #[test]
    fn unchanged_stripes_are_kept_alive() {
        let layout = fire::display_layout();
        let keep_alive = layout.keep_alive;
        let mut encoder = StripeEncoder::new(layout.clone());
        let bitmap = layout.bitmap();
        let start = Instant::now();

        encoder.update(&bitmap, start);
        assert!(encoder.update(&bitmap, start + keep_alive / 2).is_empty());
        assert_eq!(encoder.update(&bitmap, start + keep_alive).len(), 8);
        assert!(encoder.update(&bitmap, start + keep_alive * 3 / 2).is_empty());
        assert_eq!(encoder.next_deadline(), Some(start + keep_alive * 2));
    }

    #[test]
    fn refresh_margin_resends_early() {
        let layout = fire::display_layout();
        let keep_alive = layout.keep_alive;
        let mut encoder = StripeEncoder::new(layout.clone());
        encoder.set_refresh_margin(keep_alive / 4);
        let bitmap = layout.bitmap();
        let start = Instant::now();

        encoder.update(&bitmap, start);
        assert_eq!(encoder.update(&bitmap, start + keep_alive * 3 / 4).len(), 8);
    }

    #[test]
    fn invalidate_resends_everything() {
        let layout = small_layout();
        let mut encoder = StripeEncoder::new(layout.clone());
        let bitmap = layout.bitmap();
        let now = Instant::now();

        encoder.update(&bitmap, now);
        encoder.invalidate();
        assert_eq!(encoder.update(&bitmap, now).len(), 2);
    }
}
