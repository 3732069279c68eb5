//! Latency and accuracy sweeps over encrypted operations.

use crate::traits::{Decoder, Encoder, FheDecrypter, FheEncrypter};
use crate::{
    evaluator, with_ephemeral_keys, Ciphertext, Context, EphemeralKeys, Error, Plaintext, Result,
    SchemeKind,
};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Largest error accepted for the approximate scheme.
pub const APPROXIMATE_EPSILON: f64 = 1e-3;

/// Largest number of cases in a sweep.
pub const MAX_SWEEP_CASES: usize = 10_000;

/// Source of the operand pairs of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "generator", rename_all = "snake_case")]
pub enum ValueGenerator {
    /// Pairs (v, max_value - v) for v = step, 2 * step, ... up to
    /// `max_value`.
    Linear {
        /// Largest operand.
        max_value: f64,
        /// Increment between two cases.
        step: f64,
    },
    /// `count` pairs drawn uniformly in [0, max_value] from a seeded
    /// generator.
    Seeded {
        /// Number of pairs.
        count: usize,
        /// Largest operand.
        max_value: f64,
        /// Seed of the generator.
        seed: u64,
    },
}

impl ValueGenerator {
    /// Operand pairs for a scheme. Operands are rounded for the exact scheme.
    pub fn pairs(&self, kind: SchemeKind) -> Result<Vec<(f64, f64)>> {
        let pairs = match *self {
            ValueGenerator::Linear { max_value, step } => {
                check_positive(max_value)?;
                check_positive(step)?;
                check_case_count((max_value / step).floor())?;
                (1u64..)
                    .map(|i| i as f64 * step)
                    .take_while(|v| *v <= max_value)
                    .map(|v| (v, max_value - v))
                    .collect::<Vec<_>>()
            }
            ValueGenerator::Seeded {
                count,
                max_value,
                seed,
            } => {
                check_positive(max_value)?;
                check_case_count(count as f64)?;
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..count)
                    .map(|_| {
                        (
                            rng.random_range(0.0..=max_value),
                            rng.random_range(0.0..=max_value),
                        )
                    })
                    .collect::<Vec<_>>()
            }
        };

        if pairs.is_empty() {
            return Err(Error::EmptyInput("benchmark"));
        }
        Ok(match kind {
            SchemeKind::ExactInteger => pairs
                .into_iter()
                .map(|(a, b)| (a.round(), b.round()))
                .collect(),
            SchemeKind::ApproximateReal => pairs,
        })
    }
}

fn check_positive(value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::ValueOutOfRange {
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        })
    }
}

fn check_case_count(count: f64) -> Result<()> {
    if count <= MAX_SWEEP_CASES as f64 {
        Ok(())
    } else {
        Err(Error::ValueOutOfRange {
            value: count,
            min: 1.0,
            max: MAX_SWEEP_CASES as f64,
        })
    }
}

/// Operation applied to each pair (a, b) of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOperation {
    /// a + b.
    Add,
    /// sum([a, b, a]).
    Sum,
    /// a * b, with b as a plaintext scalar.
    MultiplyPlain,
}

impl SweepOperation {
    /// Expected result on plaintext operands.
    #[must_use]
    pub fn expected(&self, a: f64, b: f64) -> f64 {
        match self {
            SweepOperation::Add => a + b,
            SweepOperation::Sum => 2.0 * a + b,
            SweepOperation::MultiplyPlain => a * b,
        }
    }

    fn apply(&self, ca: &Ciphertext, cb: &Ciphertext, b: f64) -> Result<Ciphertext> {
        match self {
            SweepOperation::Add => evaluator::add(ca, cb),
            SweepOperation::Sum => evaluator::sum(&[ca.clone(), cb.clone(), ca.clone()]),
            SweepOperation::MultiplyPlain => evaluator::multiply_plain(ca, b),
        }
    }
}

impl fmt::Display for SweepOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SweepOperation::Add => "add",
            SweepOperation::Sum => "sum",
            SweepOperation::MultiplyPlain => "multiply_plain",
        })
    }
}

/// Latency of the phases of a case, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseLatency {
    /// Encoding and encryption of both operands.
    pub encrypt_us: f64,
    /// Homomorphic operation.
    pub evaluate_us: f64,
    /// Decryption and decoding of the result.
    pub decrypt_us: f64,
}

/// Outcome of one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepCase {
    /// First operand.
    pub a: f64,
    /// Second operand.
    pub b: f64,
    /// Result of the operation on the plaintext operands.
    pub expected: f64,
    /// Decrypted result.
    pub actual: f64,
    /// Absolute difference between `actual` and `expected`.
    pub error: f64,
    /// Whether the error is accepted by the scheme.
    pub within_tolerance: bool,
    /// Latency of each phase.
    pub latency: PhaseLatency,
}

/// Summary of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    /// Scheme of the sweep.
    pub scheme: SchemeKind,
    /// Operation of the sweep.
    pub operation: SweepOperation,
    /// Every case, in generation order.
    pub cases: Vec<SweepCase>,
    /// Fraction of the cases within tolerance.
    pub accuracy: f64,
    /// Mean absolute error.
    pub mean_error: f64,
    /// Largest absolute error.
    pub max_error: f64,
    /// Mean latency of each phase.
    pub mean_latency: PhaseLatency,
    /// Wall-clock duration of the sweep, key generation included.
    pub total_duration_us: f64,
}

fn micros(d: Duration) -> f64 {
    d.as_secs_f64() * 1e6
}

fn encrypt<R: RngCore + CryptoRng>(
    ctx: &Arc<Context>,
    keys: &EphemeralKeys,
    value: f64,
    rng: &mut R,
) -> Result<Ciphertext> {
    let pt = Plaintext::encode_scalar(ctx, value)?;
    keys.public_key().try_encrypt(&pt, rng)
}

fn run_case<R: RngCore + CryptoRng>(
    ctx: &Arc<Context>,
    keys: &EphemeralKeys,
    operation: SweepOperation,
    (a, b): (f64, f64),
    rng: &mut R,
) -> Result<SweepCase> {
    let start = Instant::now();
    let ca = encrypt(ctx, keys, a, rng)?;
    let cb = encrypt(ctx, keys, b, rng)?;
    let encrypted = Instant::now();
    let result = operation.apply(&ca, &cb, b)?;
    let evaluated = Instant::now();
    let actual = f64::decode_scalar(&keys.secret_key().try_decrypt(&result)?)?;
    let decrypted = Instant::now();

    let expected = operation.expected(a, b);
    let error = (actual - expected).abs();
    let within_tolerance = match ctx.kind() {
        SchemeKind::ExactInteger => error == 0.0,
        SchemeKind::ApproximateReal => error < APPROXIMATE_EPSILON,
    };

    Ok(SweepCase {
        a,
        b,
        expected,
        actual,
        error,
        within_tolerance,
        latency: PhaseLatency {
            encrypt_us: micros(encrypted - start),
            evaluate_us: micros(evaluated - encrypted),
            decrypt_us: micros(decrypted - evaluated),
        },
    })
}

/// Run `operation` on every pair of `generator`, under a key pair that only
/// lives for the duration of the sweep.
pub fn run_sweep<R: RngCore + CryptoRng>(
    ctx: &Arc<Context>,
    generator: &ValueGenerator,
    operation: SweepOperation,
    rng: &mut R,
) -> Result<SweepResult> {
    if operation == SweepOperation::MultiplyPlain && ctx.kind() == SchemeKind::ExactInteger {
        return Err(Error::UnsupportedOperation {
            operation: "multiply_plain",
            scheme: ctx.kind(),
        });
    }
    let pairs = generator.pairs(ctx.kind())?;

    let start = Instant::now();
    let cases = with_ephemeral_keys(ctx, rng, |keys, rng| {
        pairs
            .iter()
            .map(|pair| run_case(ctx, keys, operation, *pair, rng))
            .collect::<Result<Vec<_>>>()
    })?;
    let total = start.elapsed();

    let n = cases.len() as f64;
    let mean = |f: fn(&SweepCase) -> f64| cases.iter().map(f).sum::<f64>() / n;
    let accuracy = cases.iter().filter(|c| c.within_tolerance).count() as f64 / n;
    let mean_error = mean(|c| c.error);
    let max_error = cases.iter().map(|c| c.error).fold(0.0, f64::max);
    let mean_latency = PhaseLatency {
        encrypt_us: mean(|c| c.latency.encrypt_us),
        evaluate_us: mean(|c| c.latency.evaluate_us),
        decrypt_us: mean(|c| c.latency.decrypt_us),
    };
    let result = SweepResult {
        scheme: ctx.kind(),
        operation,
        cases,
        accuracy,
        mean_error,
        max_error,
        mean_latency,
        total_duration_us: micros(total),
    };

    info!(
        scheme = %result.scheme,
        operation = %result.operation,
        cases = result.cases.len(),
        accuracy = result.accuracy,
        max_error = result.max_error,
        total_duration_us = result.total_duration_us,
        "benchmark completed"
    );
    Ok(result)
}
