use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x6a1f_3c5e_92b4_d807;

/// Seeded xxh3 hasher with explicit little-endian encoding, so hashes stay stable across
/// platforms and runs.
pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_f32(&mut self, v: f32) {
        // -0.0 and 0.0 describe the same filter.
        let v = if v == 0.0 { 0.0 } else { v };
        self.write_u32(v.to_bits());
    }

    /// Fold the 64-bit digest into the 32-bit content hash carried by filter providers.
    ///
    /// `0` is reserved for "nothing recorded yet" and is never returned.
    pub(crate) fn finish_u32(self) -> u32 {
        let v = self.inner.digest();
        let folded = (v ^ (v >> 32)) as u32;
        if folded == 0 { 1 } else { folded }
    }
}
