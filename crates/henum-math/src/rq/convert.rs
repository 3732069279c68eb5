//! Implementation of conversions from and to polynomials.

use super::{traits::TryConvertFrom, Context, Poly, Representation};
use crate::{
    proto::rq::{Representation as RepresentationProto, Rq},
    Error, Result,
};
use itertools::izip;
use ndarray::{Array2, Axis};
use num_bigint::{BigInt, BigUint};
use std::sync::Arc;
use zeroize::Zeroizing;

impl From<&Poly> for Rq {
    fn from(p: &Poly) -> Self {
        let mut q = p.clone();
        q.change_representation(Representation::PowerBasis);

        let coefficients = izip!(q.coefficients.outer_iter(), p.ctx.q.iter())
            .flat_map(|(v, qi)| qi.serialize_vec(&v.to_vec()))
            .collect();

        Rq {
            representation: match p.representation {
                Representation::PowerBasis => RepresentationProto::Powerbasis as i32,
                Representation::Ntt => RepresentationProto::Ntt as i32,
            },
            degree: p.ctx.degree as u32,
            coefficients,
        }
    }
}

impl<'a> TryConvertFrom<&'a [i64]> for Poly {
    fn try_convert_from(
        v: &'a [i64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        if v.len() > ctx.degree {
            return Err(Error::Default(
                "Only `degree` signed coefficients can be specified".to_string(),
            ));
        }
        let mut out = Self::zero(ctx, Representation::PowerBasis);
        izip!(out.coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut w, qi)| {
            let reduced = Zeroizing::new(qi.reduce_vec_i64(v));
            w.iter_mut()
                .zip(reduced.iter())
                .for_each(|(wj, rj)| *wj = *rj);
        });
        out.change_representation(representation);
        Ok(out)
    }
}

impl<'a> TryConvertFrom<&'a [u64]> for Poly {
    /// Either `degree` coefficients (or fewer) shared by every modulus, or the
    /// full `moduli.len() * degree` RNS matrix in row-major order.
    fn try_convert_from(
        v: &'a [u64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        if v.len() == ctx.q.len() * ctx.degree {
            let mut coefficients = Array2::from_shape_vec((ctx.q.len(), ctx.degree), v.to_vec())
                .map_err(|e| Error::Default(e.to_string()))?;
            izip!(coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut w, qi)| {
                w.iter_mut().for_each(|wj| *wj = qi.reduce(*wj))
            });
            Ok(Self {
                ctx: ctx.clone(),
                representation,
                coefficients,
            })
        } else if v.len() <= ctx.degree {
            let mut out = Self::zero(ctx, Representation::PowerBasis);
            izip!(out.coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut w, qi)| {
                w.iter_mut()
                    .zip(v.iter())
                    .for_each(|(wj, vj)| *wj = qi.reduce(*vj))
            });
            out.change_representation(representation);
            Ok(out)
        } else {
            Err(Error::Default(
                "Either all coefficients must be specified, or only coefficients up to the degree"
                    .to_string(),
            ))
        }
    }
}

impl TryConvertFrom<&Rq> for Poly {
    fn try_convert_from(
        value: &Rq,
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        let repr = match RepresentationProto::try_from(value.representation) {
            Ok(RepresentationProto::Powerbasis) => Representation::PowerBasis,
            Ok(RepresentationProto::Ntt) => Representation::Ntt,
            _ => return Err(Error::Serialization("Unknown representation".to_string())),
        };
        if repr != representation {
            return Err(Error::Serialization(format!(
                "Representation mismatch: got {repr:?}, expected {representation:?}"
            )));
        }
        if value.degree as usize != ctx.degree {
            return Err(Error::Serialization(format!(
                "Degree mismatch: got {}, expected {}",
                value.degree, ctx.degree
            )));
        }

        let expected_nbytes: usize = ctx
            .q
            .iter()
            .map(|qi| qi.serialization_length(ctx.degree))
            .sum();
        if value.coefficients.len() != expected_nbytes {
            return Err(Error::Serialization(format!(
                "Invalid coefficients length: got {} bytes, expected {expected_nbytes}",
                value.coefficients.len()
            )));
        }

        let mut power_basis = Vec::with_capacity(ctx.q.len() * ctx.degree);
        let mut index = 0;
        for qi in ctx.q.iter() {
            let size = qi.serialization_length(ctx.degree);
            power_basis.extend(qi.deserialize_vec(&value.coefficients[index..index + size], ctx.degree)?);
            index += size;
        }

        let mut p = Poly::try_convert_from(power_basis.as_slice(), ctx, Representation::PowerBasis)?;
        p.change_representation(repr);
        Ok(p)
    }
}

impl From<&Poly> for Vec<BigUint> {
    fn from(p: &Poly) -> Self {
        let mut q = p.clone();
        q.change_representation(Representation::PowerBasis);
        q.coefficients
            .axis_iter(Axis(1))
            .map(|rests| p.ctx.rns.lift(rests))
            .collect()
    }
}

impl Poly {
    /// Returns the coefficients lifted to integers in (-q/2, q/2], where q is
    /// the product of the moduli of the context.
    #[must_use]
    pub fn centered_coefficients(&self) -> Vec<BigInt> {
        let mut q = self.clone();
        q.change_representation(Representation::PowerBasis);
        q.coefficients
            .axis_iter(Axis(1))
            .map(|rests| self.ctx.rns.lift_centered(rests))
            .collect()
    }
}
