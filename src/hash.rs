//! 32-bit FNV-1 hashing for byte and text keys.

use core::hash::{BuildHasher, Hasher};

const OFFSET_BASIS: u32 = 0x811c_9dc5;
const PRIME: u32 = 0x0100_0193;

/// FNV-1 (multiply, then xor) over a 32-bit state.
///
/// `finish` widens the state to `u64`; the table only ever consumes the low
/// 32 bits of any hasher it is given.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1Hasher(u32);

impl Fnv1Hasher {
    pub const fn new() -> Self {
        Fnv1Hasher(OFFSET_BASIS)
    }
}

impl Default for Fnv1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h = h.wrapping_mul(PRIME);
            h ^= u32::from(b);
        }
        self.0 = h;
    }

    #[inline]
    fn finish(&self) -> u64 {
        u64::from(self.0)
    }
}

/// Default `BuildHasher` for [`Table`](crate::Table).
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildFnv1Hasher;

impl BuildHasher for BuildFnv1Hasher {
    type Hasher = Fnv1Hasher;

    fn build_hasher(&self) -> Fnv1Hasher {
        Fnv1Hasher::new()
    }
}

/// Feeds `bytes` to a fresh hasher from `build` and keeps the low 32 bits.
#[inline]
pub(crate) fn hash32<S: BuildHasher>(build: &S, bytes: &[u8]) -> u32 {
    let mut h = build.build_hasher();
    h.write(bytes);
    h.finish() as u32
}
