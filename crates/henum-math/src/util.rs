//! Sampling, primality and bit-packing helpers shared by the ring modules.

use num_bigint_dig::{prime::probably_prime, BigUint};
use rand::{CryptoRng, RngCore};

/// Returns whether `p` is prime. For 64-bit inputs the test is exact.
pub fn is_prime(p: u64) -> bool {
    probably_prime(&BigUint::from(p), 0)
}

/// Sample a vector of independent centered binomial distributions of a given
/// variance. Returns an error if the variance is not in [1, 16].
pub fn sample_vec_cbd<R: RngCore + CryptoRng>(
    vector_size: usize,
    variance: usize,
    rng: &mut R,
) -> Result<Vec<i64>, &'static str> {
    if !(1..=16).contains(&variance) {
        return Err("The variance should be between 1 and 16");
    }

    let mut out = Vec::with_capacity(vector_size);

    let number_bits = 4 * variance;
    let mask_add = ((u64::MAX >> (64 - number_bits)) >> (2 * variance)) as u128;
    let mask_sub = mask_add << (2 * variance);

    let mut pool = 0u128;
    let mut pool_nbits = 0;

    for _ in 0..vector_size {
        if pool_nbits < number_bits {
            pool |= (rng.next_u64() as u128) << pool_nbits;
            pool_nbits += 64;
        }
        out.push(((pool & mask_add).count_ones() as i64) - ((pool & mask_sub).count_ones() as i64));
        pool >>= number_bits;
        pool_nbits -= number_bits;
    }

    Ok(out)
}

/// Packs `nbits`-bit integers into a little-endian byte stream.
///
/// Panics if `nbits` is not in [1, 64].
pub fn transcode_to_bytes(a: &[u64], nbits: usize) -> Vec<u8> {
    assert!((1..=64).contains(&nbits));

    let mask = (u64::MAX >> (64 - nbits)) as u128;
    let mut out = Vec::with_capacity((a.len() * nbits).div_ceil(8));

    let mut acc = 0u128;
    let mut acc_nbits = 0;
    for ai in a {
        acc |= ((*ai as u128) & mask) << acc_nbits;
        acc_nbits += nbits;
        while acc_nbits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            acc_nbits -= 8;
        }
    }
    if acc_nbits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Unpacks a little-endian byte stream into `count` integers of `nbits` bits.
///
/// Returns `None` if the stream does not hold exactly `count` values.
/// Panics if `nbits` is not in [1, 64].
pub fn transcode_from_bytes(b: &[u8], nbits: usize, count: usize) -> Option<Vec<u64>> {
    assert!((1..=64).contains(&nbits));
    if b.len() != (count * nbits).div_ceil(8) {
        return None;
    }

    let mask = (u64::MAX >> (64 - nbits)) as u128;
    let mut out = Vec::with_capacity(count);

    let mut acc = 0u128;
    let mut acc_nbits = 0;
    for bi in b {
        acc |= (*bi as u128) << acc_nbits;
        acc_nbits += 8;
        while acc_nbits >= nbits && out.len() < count {
            out.push((acc & mask) as u64);
            acc >>= nbits;
            acc_nbits -= nbits;
        }
    }

    // Padding bits of the last byte must be zero.
    (out.len() == count && acc == 0).then_some(out)
}
