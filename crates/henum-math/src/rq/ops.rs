//! Ring operations on polynomials.
//!
//! Binary operations panic when the operands do not share their moduli and
//! representation.

use super::{Poly, Representation};
use crate::zq::Modulus;
use itertools::izip;
use num_bigint::BigUint;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

impl Poly {
    /// Replaces each coefficient `a` of `self` by `f(q_i, a, b)`, where `b`
    /// is the matching coefficient of `other`.
    fn zip_with(&mut self, other: &Poly, f: impl Fn(&Modulus, u64, u64) -> u64) {
        assert_eq!(self.ctx.moduli(), other.ctx.moduli(), "Incompatible contexts");
        assert_eq!(
            self.representation, other.representation,
            "Incompatible representations"
        );
        for (mut a, b, qi) in izip!(
            self.coefficients.outer_iter_mut(),
            other.coefficients.outer_iter(),
            self.ctx.q.iter()
        ) {
            a.zip_mut_with(&b, |aj, bj| *aj = f(qi, *aj, *bj));
        }
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, p: &Poly) {
        self.zip_with(p, Modulus::add)
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, p: &Poly) {
        self.zip_with(p, Modulus::sub)
    }
}

impl MulAssign<&Poly> for Poly {
    fn mul_assign(&mut self, p: &Poly) {
        assert_eq!(
            self.representation,
            Representation::Ntt,
            "Multiplication requires an Ntt representation"
        );
        self.zip_with(p, Modulus::mul)
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;
    fn add(self, p: &Poly) -> Poly {
        let mut out = self.clone();
        out += p;
        out
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;
    fn sub(self, p: &Poly) -> Poly {
        let mut out = self.clone();
        out -= p;
        out
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;
    fn mul(self, p: &Poly) -> Poly {
        let mut out = self.clone();
        out *= p;
        out
    }
}

/// Multiplication by an integer, in either representation.
impl MulAssign<&BigUint> for Poly {
    fn mul_assign(&mut self, scalar: &BigUint) {
        let residues = self.ctx.rns.project(scalar);
        for (mut row, qi, s) in izip!(self.coefficients.outer_iter_mut(), self.ctx.q.iter(), residues) {
            if let Some(row) = row.as_slice_mut() {
                qi.scalar_mul_vec(row, s)
            }
        }
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        let mut out = self.clone();
        for (mut row, qi) in izip!(out.coefficients.outer_iter_mut(), self.ctx.q.iter()) {
            if let Some(row) = row.as_slice_mut() {
                qi.neg_vec(row)
            }
        }
        out
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        -&self
    }
}
