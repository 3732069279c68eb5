//! Scalar encoding into slot 0 of a plaintext.
//!
//! The exact scheme places the integer in the first output of the negacyclic
//! NTT modulo t. The approximate scheme places the real value in the
//! evaluation of the polynomial at exp(i * pi / N), with its conjugate slot
//! holding the same value so that the coefficients are real.

use crate::context::SchemeTables;
use crate::traits::{Decoder, Encoder};
use crate::{Context, Error, Plaintext, Result};
use henum_math::rq::{traits::TryConvertFrom, Poly, Representation};
use itertools::{izip, Itertools};
use num_traits::ToPrimitive;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Largest magnitude of a scaled value of the approximate scheme.
const MAX_SCALED_VALUE: f64 = (1u64 << 62) as f64;

/// Returns the range of scalars that can be encoded in a context.
#[must_use]
pub fn encodable_range(ctx: &Context) -> (f64, f64) {
    match &ctx.tables {
        SchemeTables::ExactInteger { plain, .. } => {
            let half = ((**plain - 1) / 2) as f64;
            (-half, half)
        }
        SchemeTables::ApproximateReal { scale, .. } => {
            let max = MAX_SCALED_VALUE / scale;
            (-max, max)
        }
    }
}

/// Encode a scalar in slot 0 of a plaintext at level 0.
pub fn encode_scalar(ctx: &Arc<Context>, value: f64) -> Result<Plaintext> {
    Plaintext::encode_scalar(ctx, value)
}

/// Decode the scalar in slot 0 of a plaintext.
pub fn decode_scalar(pt: &Plaintext) -> Result<f64> {
    f64::decode_scalar(pt)
}

impl Encoder for Plaintext {
    fn encode_scalar(ctx: &Arc<Context>, value: f64) -> Result<Self> {
        let (min, max) = encodable_range(ctx);
        let out_of_range = || Error::ValueOutOfRange { value, min, max };
        if !value.is_finite() {
            return Err(out_of_range());
        }

        let rq = ctx
            .ctx_at_level(0)
            .ok_or(Error::Math(henum_math::Error::InvalidContext))?;

        let (poly, scale) = match &ctx.tables {
            SchemeTables::ExactInteger {
                plain, plain_ntt, ..
            } => {
                let v = value.round();
                if v < min || v > max {
                    return Err(out_of_range());
                }
                let mut slots = Zeroizing::new(vec![0u64; ctx.degree()]);
                slots[0] = plain.reduce_i64(v as i64);
                plain_ntt.backward(&mut slots);
                let poly =
                    Poly::try_convert_from(slots.as_slice(), rq, Representation::PowerBasis)?;
                (poly, 1.0)
            }
            SchemeTables::ApproximateReal { scale, cosines } => {
                if value < min || value > max {
                    return Err(out_of_range());
                }
                let factor = scale * 2.0 * value / ctx.degree() as f64;
                let coeffs = Zeroizing::new(
                    cosines
                        .iter()
                        .map(|cj| (factor * cj).round() as i64)
                        .collect_vec(),
                );
                let poly =
                    Poly::try_convert_from(coeffs.as_slice(), rq, Representation::PowerBasis)?;
                (poly, *scale)
            }
        };

        Ok(Plaintext {
            ctx: ctx.clone(),
            poly,
            level: 0,
            scale,
        })
    }
}

impl Decoder<Plaintext> for f64 {
    fn decode_scalar(pt: &Plaintext) -> Result<Self> {
        let mut poly = Zeroizing::new(pt.poly.clone());
        poly.change_representation(Representation::PowerBasis);

        match &pt.ctx.tables {
            SchemeTables::ExactInteger {
                plain, plain_ntt, ..
            } => {
                // t is smaller than every modulus, so the first row holds the
                // coefficients of the message.
                let mut slots = Zeroizing::new(poly.coefficients().row(0).to_vec());
                plain.reduce_vec(&mut slots);
                plain_ntt.forward(&mut slots);
                Ok(plain.center(slots[0]) as f64)
            }
            SchemeTables::ApproximateReal { cosines, .. } => {
                if !pt.scale.is_finite() || pt.scale <= 0.0 {
                    return Err(Error::ScaleMismatch(pt.scale, pt.ctx.scale().unwrap_or_default()));
                }
                let sum: f64 = izip!(poly.centered_coefficients(), cosines.iter())
                    .map(|(c, cos)| c.to_f64().unwrap_or(f64::NAN) * cos)
                    .sum();
                Ok(sum / pt.scale)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_scalar, encodable_range, encode_scalar};
    use crate::context::SchemeTables;
    use crate::{Context, Error, ParametersBuilder, SchemeKind};
    use proptest::prelude::*;
    use std::{error::Error as StdError, sync::Arc};

    fn exact_context() -> Arc<Context> {
        let mut builder = ParametersBuilder::new(SchemeKind::ExactInteger);
        builder
            .set_degree(2048)
            .set_moduli_sizes(&[27, 27])
            .set_plain_modulus(65537);
        Context::from_builder(&builder).unwrap()
    }

    fn approximate_context() -> Arc<Context> {
        let mut builder = ParametersBuilder::new(SchemeKind::ApproximateReal);
        builder
            .set_degree(4096)
            .set_moduli_sizes(&[50, 40])
            .set_scale_bits(40);
        Context::from_builder(&builder).unwrap()
    }

    #[test]
    fn exact_integer_round_trip() -> Result<(), Box<dyn StdError>> {
        let ctx = exact_context();
        assert_eq!(encodable_range(&ctx), (-32768.0, 32768.0));
        for value in [0.0, 1.0, -1.0, 32768.0, -32768.0, 2.4, -2.6] {
            let pt = encode_scalar(&ctx, value)?;
            assert_eq!(pt.level(), 0);
            assert_eq!(decode_scalar(&pt)?, value.round());
        }
        Ok(())
    }

    #[test]
    fn exact_integer_only_fills_slot_zero() -> Result<(), Box<dyn StdError>> {
        let ctx = exact_context();
        let pt = encode_scalar(&ctx, 7.0)?;
        let mut slots = pt.poly().coefficients().row(0).to_vec();
        assert!(slots.iter().any(|c| *c != 7));
        match &ctx.tables {
            SchemeTables::ExactInteger { plain_ntt, .. } => plain_ntt.forward(&mut slots),
            SchemeTables::ApproximateReal { .. } => return Err("wrong tables".into()),
        }
        assert_eq!(slots[0], 7);
        assert!(slots[1..].iter().all(|s| *s == 0));
        Ok(())
    }

    #[test]
    fn exact_integer_out_of_range() {
        let ctx = exact_context();
        for value in [32769.0, -32769.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                encode_scalar(&ctx, value),
                Err(Error::ValueOutOfRange { .. })
            ));
        }
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn approximate_real_round_trip() -> Result<(), Box<dyn StdError>> {
        let ctx = approximate_context();
        for value in [0.0, 3.14, -2.71, 1234.5678, 1e-4] {
            let pt = encode_scalar(&ctx, value)?;
            assert_eq!(pt.scale(), 2f64.powi(40));
            assert!((decode_scalar(&pt)? - value).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn approximate_real_out_of_range() {
        let ctx = approximate_context();
        let (_, max) = encodable_range(&ctx);
        assert_eq!(max, 4194304.0);
        for value in [max * 2.0, -max * 2.0, f64::NAN, f64::NEG_INFINITY] {
            assert!(matches!(
                encode_scalar(&ctx, value),
                Err(Error::ValueOutOfRange { .. })
            ));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn exact_integer_codec(value in -32768i64..=32768) {
            let ctx = exact_context();
            let pt = encode_scalar(&ctx, value as f64).unwrap();
            prop_assert_eq!(decode_scalar(&pt).unwrap(), value as f64);
        }

        #[test]
        fn approximate_real_codec(value in -1000.0f64..1000.0) {
            let ctx = approximate_context();
            let pt = encode_scalar(&ctx, value).unwrap();
            prop_assert!((decode_scalar(&pt).unwrap() - value).abs() < 1e-6);
        }
    }
}
