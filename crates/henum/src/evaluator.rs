//! Homomorphic operations over ciphertexts.

use crate::{Ciphertext, Error, Result, SchemeKind};
use henum_math::rq::{traits::TryConvertFrom, Poly, Representation};
use itertools::Itertools;

/// Relative tolerance on the scales of added ciphertexts.
pub const SCALE_TOLERANCE: f64 = 1e-9;

const MAX_SCALED_VALUE: f64 = (1u64 << 62) as f64;

fn check_compatible(a: &Ciphertext, b: &Ciphertext) -> Result<()> {
    a.ctx.check_same(&b.ctx)?;
    if a.level != b.level {
        return Err(Error::LevelMismatch(a.level, b.level));
    }
    if a.ctx.kind() == SchemeKind::ApproximateReal
        && (a.scale - b.scale).abs() > SCALE_TOLERANCE * a.scale.abs().max(b.scale.abs())
    {
        return Err(Error::ScaleMismatch(a.scale, b.scale));
    }
    Ok(())
}

fn require_approximate(ct: &Ciphertext, operation: &'static str) -> Result<()> {
    match ct.ctx.kind() {
        SchemeKind::ApproximateReal => Ok(()),
        scheme => Err(Error::UnsupportedOperation { operation, scheme }),
    }
}

/// Add two ciphertexts of the same context, level, and scale.
pub fn add(a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
    check_compatible(a, b)?;
    Ok(Ciphertext {
        ctx: a.ctx.clone(),
        c: a.c.iter().zip(b.c.iter()).map(|(ai, bi)| ai + bi).collect_vec(),
        level: a.level,
        scale: a.scale,
    })
}

/// Negate a ciphertext.
#[must_use]
pub fn negate(a: &Ciphertext) -> Ciphertext {
    Ciphertext {
        ctx: a.ctx.clone(),
        c: a.c.iter().map(|ai| -ai).collect_vec(),
        level: a.level,
        scale: a.scale,
    }
}

/// Subtract `b` from `a`, with the same requirements as [`add`].
pub fn sub(a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
    check_compatible(a, b)?;
    add(a, &negate(b))
}

/// Sum ciphertexts from left to right.
///
/// A single ciphertext is returned unchanged.
pub fn sum(cts: &[Ciphertext]) -> Result<Ciphertext> {
    let (first, rest) = cts.split_first().ok_or(Error::EmptyInput("sum"))?;
    rest.iter()
        .try_fold(first.clone(), |acc, ct| add(&acc, ct))
}

/// Multiply a ciphertext of the approximate scheme by a scalar, then rescale
/// by the last modulus of its level.
pub fn multiply_plain(a: &Ciphertext, scalar: f64) -> Result<Ciphertext> {
    require_approximate(a, "multiply_plain")?;
    let delta = a.ctx.scale().ok_or(Error::UnsupportedOperation {
        operation: "multiply_plain",
        scheme: a.ctx.kind(),
    })?;

    let max = MAX_SCALED_VALUE / delta;
    let constant = (scalar * delta).round();
    if !scalar.is_finite() || constant.abs() > MAX_SCALED_VALUE {
        return Err(Error::ValueOutOfRange {
            value: scalar,
            min: -max,
            max,
        });
    }
    if a.level >= a.ctx.max_level() {
        return Err(Error::LevelExhausted);
    }

    let ctx = a.c[0].ctx();
    let q_last = *ctx.moduli().last().ok_or(Error::LevelExhausted)? as f64;
    let constant = Poly::try_convert_from(&[constant as i64][..], ctx, Representation::Ntt)?;

    let c = a
        .c
        .iter()
        .map(|ci| -> Result<Poly> {
            let mut p = ci * &constant;
            p.change_representation(Representation::PowerBasis);
            p.switch_down()?;
            p.change_representation(Representation::Ntt);
            Ok(p)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Ciphertext {
        ctx: a.ctx.clone(),
        c,
        level: a.level + 1,
        scale: a.scale * delta / q_last,
    })
}

/// Divide a ciphertext of the approximate scheme by a scalar, as a
/// multiplication by its reciprocal.
pub fn divide_plain(a: &Ciphertext, divisor: f64) -> Result<Ciphertext> {
    require_approximate(a, "divide_plain")?;
    if divisor == 0.0 || !divisor.is_finite() {
        return Err(Error::ValueOutOfRange {
            value: divisor,
            min: f64::MIN,
            max: f64::MAX,
        });
    }
    multiply_plain(a, 1.0 / divisor)
}

/// Average ciphertexts of the approximate scheme.
pub fn average(cts: &[Ciphertext]) -> Result<Ciphertext> {
    let first = cts.first().ok_or(Error::EmptyInput("average"))?;
    require_approximate(first, "average")?;
    divide_plain(&sum(cts)?, cts.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::{add, average, divide_plain, multiply_plain, negate, sub, sum};
    use crate::traits::{Decoder, Encoder, FheDecrypter, FheEncrypter};
    use crate::{
        Ciphertext, Context, Error, KeyPair, ParametersBuilder, Plaintext, SchemeKind,
    };
    use rand::{rng, rngs::ThreadRng};
    use std::{error::Error as StdError, sync::Arc};

    struct Fixture {
        ctx: Arc<Context>,
        keys: KeyPair,
        rng: ThreadRng,
    }

    impl Fixture {
        fn new(kind: SchemeKind) -> Result<Self, Box<dyn StdError>> {
            let mut builder = ParametersBuilder::new(kind);
            match kind {
                SchemeKind::ExactInteger => builder.set_degree(2048).set_moduli_sizes(&[27, 27]),
                SchemeKind::ApproximateReal => builder
                    .set_degree(8192)
                    .set_moduli_sizes(&[60, 40, 40])
                    .set_scale_bits(40),
            };
            let ctx = Context::from_builder(&builder)?;
            let mut rng = rng();
            let keys = KeyPair::generate(&ctx, &mut rng)?;
            Ok(Self { ctx, keys, rng })
        }

        fn encrypt(&mut self, value: f64) -> Result<Ciphertext, Box<dyn StdError>> {
            let pt = Plaintext::encode_scalar(&self.ctx, value)?;
            Ok(self.keys.public_key().try_encrypt(&pt, &mut self.rng)?)
        }

        fn decrypt(&self, ct: &Ciphertext) -> Result<f64, Box<dyn StdError>> {
            Ok(f64::decode_scalar(&self.keys.secret_key().try_decrypt(ct)?)?)
        }
    }

    #[test]
    fn exact_integer_add_sub() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ExactInteger)?;
        let a = f.encrypt(5.0)?;
        let b = f.encrypt(7.0)?;
        assert_eq!(f.decrypt(&add(&a, &b)?)?, 12.0);
        assert_eq!(f.decrypt(&sub(&a, &b)?)?, -2.0);
        assert_eq!(f.decrypt(&negate(&a))?, -5.0);
        Ok(())
    }

    #[test]
    fn exact_integer_sum() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ExactInteger)?;
        let cts = (1..=4)
            .map(|v| f.encrypt(v as f64))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(f.decrypt(&sum(&cts)?)?, 10.0);
        assert_eq!(sum(&cts[..1])?, cts[0]);
        assert_eq!(sum(&[]), Err(Error::EmptyInput("sum")));
        Ok(())
    }

    #[test]
    fn exact_integer_unsupported() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ExactInteger)?;
        let a = f.encrypt(5.0)?;
        let unsupported = |operation| Error::UnsupportedOperation {
            operation,
            scheme: SchemeKind::ExactInteger,
        };
        assert_eq!(multiply_plain(&a, 2.0), Err(unsupported("multiply_plain")));
        assert_eq!(divide_plain(&a, 2.0), Err(unsupported("divide_plain")));
        assert_eq!(average(&[a.clone(), a]), Err(unsupported("average")));
        Ok(())
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn approximate_real_add() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ApproximateReal)?;
        let a = f.encrypt(3.14)?;
        let b = f.encrypt(2.71)?;
        assert!((f.decrypt(&add(&a, &b)?)? - 5.85).abs() < 1e-3);
        assert!((f.decrypt(&sub(&a, &b)?)? - 0.43).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn approximate_real_multiply_divide() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ApproximateReal)?;
        let a = f.encrypt(3.5)?;

        let product = multiply_plain(&a, -2.0)?;
        assert_eq!(product.level(), 1);
        assert!((product.scale() / a.scale() - 1.0).abs() < 1e-3);
        assert!((f.decrypt(&product)? + 7.0).abs() < 1e-3);

        let quotient = divide_plain(&product, 7.0)?;
        assert_eq!(quotient.level(), 2);
        assert!((f.decrypt(&quotient)? + 1.0).abs() < 1e-3);

        assert_eq!(multiply_plain(&quotient, 2.0), Err(Error::LevelExhausted));
        assert!(matches!(
            divide_plain(&a, 0.0),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            multiply_plain(&a, f64::NAN),
            Err(Error::ValueOutOfRange { .. })
        ));
        Ok(())
    }

    #[test]
    fn approximate_real_average() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ApproximateReal)?;
        let cts = [2.0, 4.0, 9.0]
            .into_iter()
            .map(|v| f.encrypt(v))
            .collect::<Result<Vec<_>, _>>()?;
        assert!((f.decrypt(&average(&cts)?)? - 5.0).abs() < 1e-3);
        assert_eq!(average(&[]), Err(Error::EmptyInput("average")));
        Ok(())
    }

    #[test]
    fn incompatible_operands() -> Result<(), Box<dyn StdError>> {
        let mut f = Fixture::new(SchemeKind::ApproximateReal)?;
        let a = f.encrypt(1.0)?;
        let b = multiply_plain(&f.encrypt(1.0)?, 1.0)?;
        assert_eq!(add(&a, &b), Err(Error::LevelMismatch(0, 1)));

        let mut c = a.clone();
        c.scale *= 2.0;
        assert!(matches!(add(&a, &c), Err(Error::ScaleMismatch(..))));

        let mut g = Fixture::new(SchemeKind::ExactInteger)?;
        let d = g.encrypt(1.0)?;
        assert!(matches!(add(&a, &d), Err(Error::ContextMismatch { .. })));
        Ok(())
    }
}
