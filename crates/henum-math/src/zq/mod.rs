#![warn(missing_docs, unused_imports)]

//! Arithmetic modulo word-sized integers.
//!
//! A [`Modulus`] holds an integer `p < 2^62` together with the Barrett ratio
//! `floor(2^128 / p)`. Every method except [`Modulus::pow`] and
//! [`Modulus::inv`] runs in constant time.

pub mod primes;

use std::ops::Deref;

use crate::errors::{Error, Result};
use crate::util::{is_prime, transcode_from_bytes, transcode_to_bytes};
use itertools::Itertools;
use num_bigint::BigUint;
use num_traits::cast::ToPrimitive;
use rand::{distr::Uniform, CryptoRng, Rng, RngCore};

/// Returns `a` when `pick_a` holds and `b` otherwise, without branching.
const fn select(a: u64, b: u64, pick_a: bool) -> u64 {
    let mask = 0u64.wrapping_sub(pick_a as u64);
    b ^ ((a ^ b) & mask)
}

/// Maps `x < 2p` to `x mod p`.
pub(crate) const fn fold(x: u64, p: u64) -> u64 {
    debug_assert!(x < 2 * p);
    select(x, x.wrapping_sub(p), x < p)
}

/// An integer modulus `2 <= p < 2^62`.
#[derive(Debug, Clone)]
pub struct Modulus {
    pub(crate) p: u64,
    // floor(2^128 / p), as (low, high) words.
    ratio: (u64, u64),
    sampler: Uniform<u64>,
}

impl Eq for Modulus {}

impl PartialEq for Modulus {
    fn eq(&self, other: &Self) -> bool {
        self.p == other.p
    }
}

impl Deref for Modulus {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.p
    }
}

impl Modulus {
    /// Creates a modulus, or fails with [`Error::InvalidModulus`] when `p`
    /// is smaller than 2 or needs more than 62 bits.
    pub fn new(p: u64) -> Result<Self> {
        if !(2..1 << 62).contains(&p) {
            return Err(Error::InvalidModulus(p));
        }
        let ratio = ((BigUint::from(1u64) << 128usize) / p)
            .to_u128()
            .ok_or(Error::InvalidModulus(p))?;
        Ok(Self {
            p,
            ratio: (ratio as u64, (ratio >> 64) as u64),
            sampler: Uniform::new(0, p).map_err(|_| Error::InvalidModulus(p))?,
        })
    }

    /// Bit length of `p`.
    #[must_use]
    pub const fn bits(&self) -> usize {
        (u64::BITS - self.p.leading_zeros()) as usize
    }

    /// `a + b mod p` for reduced `a` and `b`.
    #[must_use]
    pub const fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        fold(a + b, self.p)
    }

    /// `a - b mod p` for reduced `a` and `b`.
    #[must_use]
    pub const fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        fold(self.p + a - b, self.p)
    }

    /// `-a mod p` for a reduced `a`.
    #[must_use]
    pub const fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        fold(self.p - a, self.p)
    }

    /// `a * b mod p` for reduced `a` and `b`.
    #[must_use]
    pub const fn mul(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        fold(self.barrett_wide(a as u128 * b as u128), self.p)
    }

    /// Precomputes `floor(b * 2^64 / p)` for repeated multiplications by `b`.
    #[must_use]
    pub const fn shoup(&self, b: u64) -> u64 {
        debug_assert!(b < self.p);
        (((b as u128) << 64) / self.p as u128) as u64
    }

    /// `a * b mod p`, where `b_shoup` is [`Modulus::shoup`] of `b`.
    #[must_use]
    pub const fn mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        fold(self.lazy_mul_shoup(a, b, b_shoup), self.p)
    }

    /// Like [`Modulus::mul_shoup`], with a result in `[0, 2p)`.
    #[must_use]
    pub const fn lazy_mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        debug_assert!(b < self.p && b_shoup == self.shoup(b));
        let quotient = (a as u128 * b_shoup as u128) >> 64;
        (a as u128 * b as u128 - quotient * self.p as u128) as u64
    }

    /// `a mod p`.
    #[must_use]
    pub const fn reduce(&self, a: u64) -> u64 {
        fold(self.lazy_reduce(a), self.p)
    }

    /// `a mod p`, with a result in `[0, 2p)`.
    #[must_use]
    pub const fn lazy_reduce(&self, a: u64) -> u64 {
        let (lo, hi) = (self.ratio.0 as u128, self.ratio.1 as u128);
        let quotient = ((a as u128 * lo >> 64) + a as u128 * hi) >> 64;
        (a as u128 - quotient * self.p as u128) as u64
    }

    /// `a mod p` for a signed `a`.
    #[must_use]
    pub const fn reduce_i64(&self, a: i64) -> u64 {
        // Shift by p * 2^64 to stay non-negative.
        let shifted = ((self.p as i128) << 64) + a as i128;
        fold(self.barrett_wide(shifted as u128), self.p)
    }

    /// Barrett reduction into `[0, 2p)` of `a < 2^126`.
    const fn barrett_wide(&self, a: u128) -> u64 {
        let (a_lo, a_hi) = (a as u64 as u128, a >> 64);
        let (lo, hi) = (self.ratio.0 as u128, self.ratio.1 as u128);
        let middle = (a_lo * lo >> 64) + a_lo * hi + a_hi * lo;
        let quotient = (middle >> 64) + a_hi * hi;
        let r = (a - quotient * self.p as u128) as u64;
        debug_assert!(r < 2 * self.p);
        r
    }

    /// Representative of `a` in `(-p/2, p/2]`.
    #[must_use]
    pub const fn center(&self, a: u64) -> i64 {
        debug_assert!(a < self.p);
        select(a.wrapping_sub(self.p), a, a > self.p / 2) as i64
    }

    /// `a^n mod p`, in variable time.
    #[must_use]
    pub fn pow(&self, a: u64, n: u64) -> u64 {
        debug_assert!(a < self.p);
        let (mut acc, mut base, mut e) = (1 % self.p, a, n);
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            e >>= 1;
        }
        acc
    }

    /// Inverse of `a`, or `None` when `a = 0` or `p` is not prime.
    #[must_use]
    pub fn inv(&self, a: u64) -> Option<u64> {
        (a != 0 && is_prime(self.p)).then(|| self.pow(a, self.p - 2))
    }

    /// Multiplies every element of `a` by `b` in place.
    pub fn scalar_mul_vec(&self, a: &mut [u64], b: u64) {
        let b_shoup = self.shoup(b);
        for ai in a.iter_mut() {
            *ai = self.mul_shoup(*ai, b, b_shoup)
        }
    }

    /// Negates every element of `a` in place.
    pub fn neg_vec(&self, a: &mut [u64]) {
        for ai in a.iter_mut() {
            *ai = self.neg(*ai)
        }
    }

    /// Reduces every element of `a` in place.
    pub fn reduce_vec(&self, a: &mut [u64]) {
        for ai in a.iter_mut() {
            *ai = self.reduce(*ai)
        }
    }

    /// Reduces signed integers.
    #[must_use]
    pub fn reduce_vec_i64(&self, a: &[i64]) -> Vec<u64> {
        a.iter().map(|ai| self.reduce_i64(*ai)).collect_vec()
    }

    /// Draws `size` uniform elements.
    pub fn random_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<u64> {
        rng.sample_iter(&self.sampler).take(size).collect_vec()
    }

    /// Number of bytes taken by `size` packed elements.
    #[must_use]
    pub const fn serialization_length(&self, size: usize) -> usize {
        (self.bits() * size).div_ceil(8)
    }

    /// Packs reduced elements on [`Modulus::bits`] bits each.
    #[must_use]
    pub fn serialize_vec(&self, a: &[u64]) -> Vec<u8> {
        transcode_to_bytes(a, self.bits())
    }

    /// Unpacks `size` elements, rejecting a wrong length or an element that
    /// is not reduced.
    pub fn deserialize_vec(&self, b: &[u8], size: usize) -> Result<Vec<u64>> {
        let v = transcode_from_bytes(b, self.bits(), size).ok_or_else(|| {
            Error::Serialization(format!("Invalid coefficient encoding modulo {}", self.p))
        })?;
        match v.iter().find(|vi| **vi >= self.p) {
            Some(vi) => Err(Error::Serialization(format!(
                "Coefficient {vi} out of range modulo {}",
                self.p
            ))),
            None => Ok(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Modulus;
    use itertools::Itertools;
    use proptest::collection::vec as prop_vec;
    use proptest::prelude::{any, Strategy};
    use rand::rng;

    fn moduli() -> impl Strategy<Value = Modulus> {
        (2u64..1 << 62).prop_map(|p| Modulus::new(p).unwrap())
    }

    proptest! {
        #[test]
        fn rejects_out_of_range(p: u64) {
            prop_assert!(Modulus::new(p | (1 << 62)).is_err());
            prop_assert!(Modulus::new(p % 2).is_err());
        }

        #[test]
        fn field_operations(p in moduli(), a: u64, b: u64) {
            let (q, a, b) = (*p as u128, p.reduce(a), p.reduce(b));
            prop_assert_eq!(a as u128, a as u128 % q);
            prop_assert_eq!(p.add(a, b) as u128, (a as u128 + b as u128) % q);
            prop_assert_eq!(p.sub(a, b) as u128, (q + a as u128 - b as u128) % q);
            prop_assert_eq!(p.neg(a) as u128, (q - a as u128) % q);
            prop_assert_eq!(p.mul(a, b) as u128, (a as u128 * b as u128) % q);
            prop_assert_eq!(p.mul_shoup(a, b, p.shoup(b)), p.mul(a, b));
            prop_assert!(p.lazy_reduce(a) < 2 * *p);
        }

        #[test]
        fn signed_reduction(p in moduli(), a: i64) {
            let expected = (a as i128).rem_euclid(*p as i128) as u64;
            prop_assert_eq!(p.reduce_i64(a), expected);
            prop_assert_eq!(p.reduce_vec_i64(&[a, 0]), vec![expected, 0]);
        }

        #[test]
        fn center(p in moduli(), a: i64) {
            let half = (*p / 2) as i64;
            prop_assume!(a > -half && a <= half);
            prop_assert_eq!(p.center(p.reduce_i64(a)), a);
        }

        #[test]
        fn vector_operations(p in moduli(), mut a in prop_vec(any::<u64>(), 1..64), s: u64) {
            p.reduce_vec(&mut a);
            let s = p.reduce(s);

            let mut c = a.clone();
            p.scalar_mul_vec(&mut c, s);
            prop_assert_eq!(c, a.iter().map(|ai| p.mul(*ai, s)).collect_vec());

            let mut c = a.clone();
            p.neg_vec(&mut c);
            prop_assert_eq!(c, a.iter().map(|ai| p.neg(*ai)).collect_vec());
        }

        #[test]
        fn packing(p in moduli(), mut a in prop_vec(any::<u64>(), 8)) {
            p.reduce_vec(&mut a);
            let b = p.serialize_vec(&a);
            prop_assert_eq!(b.len(), p.serialization_length(8));
            prop_assert_eq!(p.deserialize_vec(&b, 8).unwrap(), a);
        }
    }

    #[test]
    fn unpacking_rejects_unreduced() {
        // 13 fits on 4 bits, so 15 decodes but is not reduced.
        let p = Modulus::new(13).unwrap();
        let b = p.serialize_vec(&[15, 0]);
        assert!(p.deserialize_vec(&b, 2).is_err());
        assert!(p.deserialize_vec(&b, 3).is_err());
    }

    #[test]
    fn exponentiation_and_inverse() {
        let mut rng = rng();
        for p in [2u64, 3, 17, 1987, 4611686018326724609] {
            let q = Modulus::new(p).unwrap();
            assert_eq!(q.pow(p - 1, 0), 1);
            assert_eq!(q.pow(p - 1, 1), p - 1);
            assert_eq!(q.pow(p - 1, 2), 1);
            assert!(q.inv(0).is_none());
            assert_eq!(q.inv(1), Some(1));

            for a in q.random_vec(20, &mut rng) {
                match q.inv(a) {
                    None => assert_eq!(a, 0),
                    Some(b) => assert_eq!(q.mul(a, b), 1),
                }
            }
        }
        assert!(Modulus::new(16).unwrap().inv(3).is_none());
    }
}
