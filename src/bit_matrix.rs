//! BitMatrixHasher: resampleable member of a universal hash family over GF(2).

use rand::Rng;

/// 64-bit FNV-1a offset basis; start value of the key mix.
const MIX_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
/// 64-bit FNV-1a prime; polynomial multiplier of the key mix.
const MIX_PRIME: u64 = 0x0000_0100_0000_01b3;
/// Golden-ratio word; folds the key length into the fingerprint.
const LEN_FOLD: u64 = 0x9e37_79b9_7f4a_7c15;
/// Left rotation applied after every byte step.
const MIX_ROTATE: u32 = 23;

/// Expands a key into the 64-bit vector the matrix multiplies.
///
/// Polynomial rolling mix: multiply by the FNV prime, XOR the byte,
/// rotate, and finally fold in the key length. Every hash-function
/// instance shares this fixed encoding; only the matrix is resampled.
/// A naive identity encoding (`key.hashCode()` style) would make short
/// keys occupy a tiny subspace and collide under every matrix, which
/// the rolling mix avoids.
#[inline]
pub fn mix_key(key: &str) -> u64 {
    let mut acc = MIX_OFFSET;
    for &byte in key.as_bytes() {
        acc = (acc.wrapping_mul(MIX_PRIME) ^ u64::from(byte)).rotate_left(MIX_ROTATE);
    }
    acc ^ (key.len() as u64).wrapping_mul(LEN_FOLD)
}

/// Number of output bits needed to index `[0, capacity)`.
fn output_bits_for(capacity: usize) -> u32 {
    debug_assert!(capacity >= 1);
    (usize::BITS - capacity.saturating_sub(1).leading_zeros()).max(1)
}

/// A randomly drawn `b x 64` bit matrix over GF(2), mapping string keys
/// into `[0, capacity)`.
///
/// Each row is one machine word, so the matrix-vector product is a
/// single `AND` plus popcount parity per output bit. For two fixed
/// distinct keys, a freshly sampled matrix makes them collide with
/// probability on the order of `2^-b` (before the final modulo), which
/// is what keeps the expected number of rehash trials constant.
///
/// Instances are immutable once sampled; a rehash draws a whole new
/// matrix rather than perturbing this one.
#[derive(Clone, Debug)]
pub struct BitMatrixHasher {
    rows: Vec<u64>,
    capacity: usize,
}

impl BitMatrixHasher {
    /// Draws a fresh random matrix sized for `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Table constructors reject zero
    /// capacity with [`CapacityError`](crate::CapacityError) before it
    /// can reach this layer.
    pub fn sample<R: Rng + ?Sized>(capacity: usize, rng: &mut R) -> Self {
        assert!(capacity >= 1, "hash range must be nonempty");
        let bits = output_bits_for(capacity);
        let rows = (0..bits).map(|_| rng.gen::<u64>()).collect();
        Self { rows, capacity }
    }

    /// Maps `key` to a slot index in `[0, capacity)`.
    #[inline]
    pub fn index_of(&self, key: &str) -> usize {
        let bits = mix_key(key);
        let mut value: u64 = 0;
        for (i, row) in self.rows.iter().enumerate() {
            // Parity of the AND is the GF(2) inner product of row and key bits.
            let parity = u64::from((row & bits).count_ones() & 1);
            value |= parity << i;
        }
        (value % self.capacity as u64) as usize
    }

    /// Slot range this instance maps into.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Output bit-width `b` of the matrix.
    pub fn output_bits(&self) -> u32 {
        self.rows.len() as u32
    }
}
