//! Negacyclic Number-Theoretic Transform in Z_p\[x\] / (x^n + 1).

use crate::{
    util::is_prime,
    zq::{fold, Modulus},
};
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::iter::successors;

/// Whether `p` is a prime with `p = 1 mod 2n`, for `n` a power of two of at
/// least 8.
pub fn supports_ntt(p: u64, n: usize) -> bool {
    n >= 8 && n.is_power_of_two() && p % (2 * n as u64) == 1 && is_prime(p)
}

/// A constant multiplier with its Shoup precomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Twiddle {
    w: u64,
    w_shoup: u64,
}

impl Twiddle {
    fn new(p: &Modulus, w: u64) -> Self {
        Self {
            w,
            w_shoup: p.shoup(w),
        }
    }
}

/// Transform of size `n` modulo `p`.
///
/// [`NttOperator::forward`] evaluates a polynomial at the odd powers of a
/// primitive 2n-th root of unity `psi`, in bit-reversed order, and
/// [`NttOperator::backward`] interpolates it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttOperator {
    p: Modulus,
    size: usize,
    // psi^rev(i)
    forward_twiddles: Box<[Twiddle]>,
    // psi^-(rev(i) + 1)
    backward_twiddles: Box<[Twiddle]>,
    size_inv: Twiddle,
}

impl NttOperator {
    /// Builds the operator, or returns `None` when `p` does not support a
    /// transform of this size.
    pub fn new(p: &Modulus, size: usize) -> Option<Self> {
        if !supports_ntt(p.p, size) {
            return None;
        }
        let psi = Self::find_root(p, size)?;
        let psi_inv = p.inv(psi)?;

        let powers = successors(Some(1u64), |w| Some(p.mul(*w, psi)))
            .take(size)
            .collect_vec();
        let inverse_powers = successors(Some(psi_inv), |w| Some(p.mul(*w, psi_inv)))
            .take(size)
            .collect_vec();

        let shift = size.leading_zeros() + 1;
        let reversed = |i: usize| i.reverse_bits() >> shift;
        Some(Self {
            p: p.clone(),
            size,
            forward_twiddles: (0..size)
                .map(|i| Twiddle::new(p, powers[reversed(i)]))
                .collect(),
            backward_twiddles: (0..size)
                .map(|i| Twiddle::new(p, inverse_powers[reversed(i)]))
                .collect(),
            size_inv: Twiddle::new(p, p.inv(size as u64)?),
        })
    }

    /// Size of the transform.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Forward transform in place.
    ///
    /// # Panics
    ///
    /// Panics if `a` does not have [`NttOperator::size`] elements.
    pub fn forward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);
        let twice_p = 2 * self.p.p;

        // Cooley-Tukey, with values kept in [0, 4p).
        let mut twiddles = self.forward_twiddles.iter().skip(1);
        let mut half = self.size / 2;
        while half > 0 {
            for (block, t) in a.chunks_exact_mut(2 * half).zip(twiddles.by_ref()) {
                let (left, right) = block.split_at_mut(half);
                for (x, y) in left.iter_mut().zip(right.iter_mut()) {
                    let u = fold(*x, twice_p);
                    let v = self.p.lazy_mul_shoup(*y, t.w, t.w_shoup);
                    *x = u + v;
                    *y = u + twice_p - v;
                }
            }
            half /= 2;
        }

        for ai in a.iter_mut() {
            *ai = fold(fold(*ai, twice_p), self.p.p);
        }
    }

    /// Backward transform in place.
    ///
    /// # Panics
    ///
    /// Panics if `a` does not have [`NttOperator::size`] elements.
    pub fn backward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);
        let twice_p = 2 * self.p.p;

        // Gentleman-Sande, with values kept in [0, 2p).
        let mut twiddles = self.backward_twiddles.iter();
        let mut half = 1;
        while half < self.size {
            for (block, t) in a.chunks_exact_mut(2 * half).zip(twiddles.by_ref()) {
                let (left, right) = block.split_at_mut(half);
                for (x, y) in left.iter_mut().zip(right.iter_mut()) {
                    let (u, v) = (*x, *y);
                    *x = fold(u + v, twice_p);
                    *y = self.p.lazy_mul_shoup(u + twice_p - v, t.w, t.w_shoup);
                }
            }
            half *= 2;
        }

        let Twiddle { w, w_shoup } = self.size_inv;
        for ai in a.iter_mut() {
            *ai = self.p.mul_shoup(*ai, w, w_shoup);
        }
    }

    /// A primitive 2n-th root of unity, drawn from a fixed seed so that
    /// every operator for `(p, n)` uses the same root.
    fn find_root(p: &Modulus, n: usize) -> Option<u64> {
        let cofactor = (p.p - 1) / (2 * n as u64);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        (0..100)
            .map(|_| p.pow(rng.random_range(0..p.p), cofactor))
            .find(|w| p.pow(*w, n as u64) == p.p - 1)
    }
}
