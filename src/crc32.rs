//! Incremental CRC-32 checksum accumulator.
//!
//! Binary codeplug writers append an integrity trailer computed over the
//! encoded artifact. The accumulator keeps running 32-bit state and can be
//! queried at any point mid-stream; there is no separate finalize step, so
//! partial sums are meaningful for incremental integrity checks.
//!
//! Uses the standard reflected CRC-32 polynomial (the one Ethernet, zip and
//! PNG use) via `crc32fast`.

/// Running CRC-32 checksum over a byte stream.
///
/// ```rust
/// use codeplug::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"123456789");
/// assert_eq!(crc.get(), 0xCBF4_3926);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    /// Creates a new accumulator in its seed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a single byte into the running state.
    pub fn update_byte(&mut self, byte: u8) {
        self.hasher.update(&[byte]);
    }

    /// Folds a sequence of bytes into the running state, in order.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of everything folded in so far.
    ///
    /// The accumulator remains usable; subsequent updates continue from the
    /// current state.
    pub fn get(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}
