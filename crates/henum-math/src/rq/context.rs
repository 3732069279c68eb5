use itertools::Itertools;
use num_bigint::BigUint;
use std::{fmt::Debug, iter::successors, sync::Arc};

use crate::{ntt::NttOperator, rns::RnsContext, zq::Modulus, Error, Result};

/// Moduli and degree shared by a family of polynomials.
///
/// Each context links to the one with its last modulus dropped, which is
/// where [`super::Poly::switch_down`] sends a polynomial.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Context {
    pub(crate) moduli: Box<[u64]>,
    pub(crate) q: Box<[Modulus]>,
    pub(crate) rns: Arc<RnsContext>,
    pub(crate) ops: Box<[NttOperator]>,
    pub(crate) degree: usize,
    // q_last^-1 mod q_i and its Shoup form, for every q_i but the last.
    pub(crate) switch_factors: Box<[(u64, u64)]>,
    pub(crate) next_context: Option<Arc<Context>>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("moduli", &self.moduli)
            .field("degree", &self.degree)
            .finish()
    }
}

impl Context {
    /// Creates a context for polynomials of `degree` coefficients modulo the
    /// product of `moduli`.
    ///
    /// The degree must be a power of two of at least 8, and every modulus an
    /// NTT-friendly prime for this degree.
    pub fn new(moduli: &[u64], degree: usize) -> Result<Self> {
        if degree < 8 || !degree.is_power_of_two() {
            return Err(Error::Default(format!(
                "Degree {degree} is not a power of two of at least 8"
            )));
        }
        let (&q_last, rest) = moduli
            .split_last()
            .ok_or_else(|| Error::Default("The list of moduli is empty".to_string()))?;

        let mut q = Vec::with_capacity(moduli.len());
        let mut ops = Vec::with_capacity(moduli.len());
        for &modulus in moduli {
            let qi = Modulus::new(modulus)?;
            ops.push(NttOperator::new(&qi, degree).ok_or_else(|| {
                Error::Default(format!("Modulus {modulus} does not support the NTT of size {degree}"))
            })?);
            q.push(qi);
        }

        let switch_factors = q[..rest.len()]
            .iter()
            .map(|qi| {
                let inv = qi.inv(qi.reduce(q_last)).ok_or(Error::InvalidModulus(**qi))?;
                Ok((inv, qi.shoup(inv)))
            })
            .collect::<Result<Box<[_]>>>()?;

        let next_context = match rest {
            [] => None,
            _ => Some(Arc::new(Context::new(rest, degree)?)),
        };

        Ok(Self {
            moduli: moduli.into(),
            q: q.into_boxed_slice(),
            rns: Arc::new(RnsContext::new(moduli)?),
            ops: ops.into_boxed_slice(),
            degree,
            switch_factors,
            next_context,
        })
    }

    /// Same as [`Context::new`], in an `Arc`.
    pub fn new_arc(moduli: &[u64], degree: usize) -> Result<Arc<Self>> {
        Self::new(moduli, degree).map(Arc::new)
    }

    /// Product of the moduli.
    pub fn modulus(&self) -> &BigUint {
        self.rns.modulus()
    }

    /// The moduli.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// The moduli, with their arithmetic.
    pub fn moduli_operators(&self) -> &[Modulus] {
        &self.q
    }

    /// Number of coefficients of the polynomials.
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// The context without the last modulus, if there are at least two.
    pub fn next_context(&self) -> Option<&Arc<Context>> {
        self.next_context.as_ref()
    }

    /// `self` followed by every context reachable with
    /// [`Context::next_context`].
    pub fn chain(self: &Arc<Self>) -> Vec<Arc<Self>> {
        successors(Some(self.clone()), |ctx| ctx.next_context.clone()).collect_vec()
    }
}
