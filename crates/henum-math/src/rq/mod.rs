#![warn(missing_docs, unused_imports)]

//! Polynomials of `R_q = Z_q[x] / (x^n + 1)`, stored as one row of
//! coefficients per modulus of `q`.

mod context;
mod convert;
mod ops;
mod serialize;

pub mod traits;

use self::traits::TryConvertFrom;
use crate::{util::sample_vec_cbd, Error, Result};
pub use context::Context;
use itertools::izip;
use ndarray::{Array2, ArrayView2, Axis};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

/// How the rows of a [`Poly`] are stored.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Coefficients `c_0, ..., c_(n-1)` of `c_0 + c_1 x + ... + c_(n-1) x^(n-1)`.
    #[default]
    PowerBasis,
    /// Image of the coefficients by the forward NTT.
    Ntt,
}

/// An element of `R_q` for a given [`Context`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    ctx: Arc<Context>,
    representation: Representation,
    coefficients: Array2<u64>,
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        self.coefficients.fill(0);
    }
}

impl Poly {
    /// The zero polynomial.
    #[must_use]
    pub fn zero(ctx: &Arc<Context>, representation: Representation) -> Self {
        Self {
            ctx: ctx.clone(),
            representation,
            coefficients: Array2::zeros((ctx.q.len(), ctx.degree)),
        }
    }

    /// Representation of the polynomial.
    #[must_use]
    pub const fn representation(&self) -> &Representation {
        &self.representation
    }

    /// Converts the polynomial to the `to` representation.
    pub fn change_representation(&mut self, to: Representation) {
        if self.representation == to {
            return;
        }
        for (mut row, op) in izip!(self.coefficients.outer_iter_mut(), self.ctx.ops.iter()) {
            if let Some(row) = row.as_slice_mut() {
                match to {
                    Representation::Ntt => op.forward(row),
                    Representation::PowerBasis => op.backward(row),
                }
            }
        }
        self.representation = to;
    }

    /// A polynomial with uniform coefficients.
    pub fn random<R: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        rng: &mut R,
    ) -> Self {
        let mut p = Poly::zero(ctx, representation);
        for (mut row, qi) in izip!(p.coefficients.outer_iter_mut(), ctx.q.iter()) {
            row.assign(&ndarray::Array1::from(qi.random_vec(ctx.degree, rng)));
        }
        p
    }

    /// A polynomial with coefficients drawn from a centered binomial
    /// distribution of the given variance, which must be in `[1, 16]`.
    pub fn small<T: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        variance: usize,
        rng: &mut T,
    ) -> Result<Self> {
        let coeffs = Zeroizing::new(
            sample_vec_cbd(ctx.degree, variance, rng).map_err(|e| Error::Default(e.to_string()))?,
        );
        Poly::try_convert_from(coeffs.as_slice(), ctx, representation)
    }

    /// The coefficients, one row per modulus.
    #[must_use]
    pub fn coefficients(&self) -> ArrayView2<'_, u64> {
        self.coefficients.view()
    }

    /// The context of the polynomial.
    #[must_use]
    pub fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Divides the polynomial by the last modulus `q_k` with rounding, and
    /// moves it to [`Context::next_context`].
    ///
    /// Fails with [`Error::NoMoreContext`] on a single modulus, and with
    /// [`Error::IncorrectRepresentation`] outside of
    /// [`Representation::PowerBasis`].
    pub fn switch_down(&mut self) -> Result<()> {
        let next_context = self.ctx.next_context.clone().ok_or(Error::NoMoreContext)?;
        if self.representation != Representation::PowerBasis {
            return Err(Error::IncorrectRepresentation(
                self.representation,
                Representation::PowerBasis,
            ));
        }

        let k = self.ctx.q.len() - 1;
        let q_last = &self.ctx.q[k];
        let half = **q_last / 2;

        // Rounding x / q_k is flooring (x + q_k / 2) / q_k, so the remainder
        // to subtract is r = (x + q_k / 2 mod q_k) - q_k / 2.
        let shifted = Zeroizing::new(
            self.coefficients
                .row(k)
                .iter()
                .map(|c| q_last.add(*c, half))
                .collect::<Vec<_>>(),
        );
        for (mut row, qi, (inv, inv_shoup)) in izip!(
            self.coefficients.outer_iter_mut(),
            self.ctx.q.iter(),
            self.ctx.switch_factors.iter(),
        ) {
            let half_mod_qi = qi.reduce(half);
            for (c, s) in row.iter_mut().zip(shifted.iter()) {
                let remainder = qi.sub(qi.reduce(*s), half_mod_qi);
                *c = qi.mul_shoup(qi.sub(*c, remainder), *inv, *inv_shoup);
            }
        }

        self.coefficients.row_mut(k).fill(0);
        self.coefficients.remove_index(Axis(0), k);
        self.ctx = next_context;
        Ok(())
    }
}
