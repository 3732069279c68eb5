//! Generation of NTT-friendly primes.

use crate::util::is_prime;

/// Generate a `num_bits`-bit prime, congruent to 1 mod `modulo`, strictly
/// smaller than `upper_bound`. Note that `num_bits` must belong to (10..=62),
/// and upper_bound must be <= 1 << num_bits.
pub fn generate_prime(num_bits: usize, modulo: u64, upper_bound: u64) -> Option<u64> {
    if !(10..=62).contains(&num_bits) || modulo == 0 || upper_bound > (1u64 << num_bits) {
        return None;
    }

    let leading_zeros = (64 - num_bits) as u32;

    let mut tentative_prime = upper_bound.checked_sub(1)?;
    while tentative_prime % modulo != 1 && tentative_prime.leading_zeros() == leading_zeros {
        tentative_prime -= 1
    }

    while tentative_prime.leading_zeros() == leading_zeros
        && !is_prime(tentative_prime)
        && tentative_prime >= modulo
    {
        tentative_prime -= modulo
    }

    if tentative_prime.leading_zeros() == leading_zeros && is_prime(tentative_prime) {
        Some(tentative_prime)
    } else {
        None
    }
}

/// Generate `count` distinct `num_bits`-bit primes congruent to 1 mod
/// `modulo`, in decreasing order, all strictly smaller than `upper_bound`.
pub fn generate_primes(
    num_bits: usize,
    modulo: u64,
    upper_bound: u64,
    count: usize,
) -> Option<Vec<u64>> {
    let mut primes = Vec::with_capacity(count);
    let mut bound = upper_bound;
    while primes.len() < count {
        let p = generate_prime(num_bits, modulo, bound)?;
        primes.push(p);
        bound = p;
    }
    Some(primes)
}

#[cfg(test)]
mod tests {
    use super::{generate_prime, generate_primes};
    use crate::util::is_prime;

    // Same primes as the NFLlib library.
    // <https://github.com/quarkslab/NFLlib/blob/master/include/nfl/params.hpp>
    #[test]
    fn nfl_62bit_primes() {
        let generated = generate_primes(62, 2 * 1048576, u64::MAX >> 2, 5).unwrap();
        assert_eq!(
            generated,
            vec![
                4611686018326724609,
                4611686018309947393,
                4611686018282684417,
                4611686018257518593,
                4611686018232352769,
            ]
        )
    }

    #[test]
    fn batching_prime() {
        // A 20-bit prime supporting batching at degree 8192.
        let t = generate_prime(20, 2 * 8192, 1 << 20).unwrap();
        assert_eq!(t % 16384, 1);
        assert!(is_prime(t));
        assert_eq!(64 - t.leading_zeros(), 20);
    }

    #[test]
    fn upper_bound_too_large() {
        assert!(generate_prime(62, 2 * 1048576, (1 << 62) + 1).is_none());
    }

    #[test]
    fn modulo_too_large() {
        assert!(generate_prime(10, 2048, 1 << 10).is_none());
    }

    #[test]
    fn not_found() {
        // 1033 is the smallest 11-bit prime congruent to 1 modulo 16.
        assert!(generate_prime(11, 16, 1033).is_none());
    }
}
