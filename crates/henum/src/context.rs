//! Evaluation contexts bound to a set of parameters.

use crate::{Error, Parameters, ParametersBuilder, ParametersError, Result, SchemeKind};
use henum_math::{ntt::NttOperator, rq::Context as RqContext, zq::Modulus};
use itertools::Itertools;
use num_bigint::BigUint;
use std::f64::consts::PI;
use std::fmt::Debug;
use std::sync::Arc;

/// Tables that only exist for one scheme.
#[derive(Debug, Clone)]
pub(crate) enum SchemeTables {
    ExactInteger {
        /// Plaintext modulus t.
        plain: Modulus,
        /// Negacyclic NTT modulo t, whose outputs are the slots.
        plain_ntt: NttOperator,
        /// floor(q / t) for the full modulus chain.
        delta: BigUint,
    },
    ApproximateReal {
        /// 2^scale_bits.
        scale: f64,
        /// cos(pi * j / degree) for every coefficient index j.
        cosines: Box<[f64]>,
    },
}

/// A context binds parameters to the tables needed to encode, encrypt, and
/// evaluate. Objects created under different contexts never mix.
#[derive(Clone)]
pub struct Context {
    par: Arc<Parameters>,
    chain: Box<[Arc<RqContext>]>,
    fingerprint: [u8; 32],
    pub(crate) tables: SchemeTables,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("parameters", &self.par)
            .field("fingerprint", &self.fingerprint_hex())
            .finish()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Context {}

impl Context {
    /// Creates a context from parameters, precomputing the modulus chain and
    /// the tables of the scheme.
    pub fn new(par: &Arc<Parameters>) -> Result<Self> {
        let ctx = RqContext::new_arc(par.moduli(), par.degree())?;
        let chain = ctx.chain().into_boxed_slice();

        let tables = match par.kind() {
            SchemeKind::ExactInteger => {
                let t = par.plain_modulus().ok_or_else(|| {
                    ParametersError::InvalidPlaintext("Missing plain modulus".to_string())
                })?;
                let plain = Modulus::new(t)?;
                let plain_ntt = NttOperator::new(&plain, par.degree()).ok_or_else(|| {
                    ParametersError::InvalidPlaintext(format!(
                        "The plain modulus {t} does not support batching"
                    ))
                })?;
                SchemeTables::ExactInteger {
                    delta: ctx.modulus() / t,
                    plain,
                    plain_ntt,
                }
            }
            SchemeKind::ApproximateReal => {
                let scale_bits = par.scale_bits().ok_or_else(|| {
                    ParametersError::TooFewSpecified("Missing scale".to_string())
                })?;
                let n = par.degree() as f64;
                SchemeTables::ApproximateReal {
                    scale: 2f64.powi(scale_bits as i32),
                    cosines: (0..par.degree())
                        .map(|j| (PI * j as f64 / n).cos())
                        .collect_vec()
                        .into_boxed_slice(),
                }
            }
        };

        Ok(Self {
            fingerprint: par.fingerprint(),
            par: par.clone(),
            chain,
            tables,
        })
    }

    /// Creates a context in an `Arc`.
    pub fn new_arc(par: &Arc<Parameters>) -> Result<Arc<Self>> {
        Self::new(par).map(Arc::new)
    }

    /// Builds the parameters and the context in one step.
    pub fn from_builder(builder: &ParametersBuilder) -> Result<Arc<Self>> {
        Self::new_arc(&builder.build_arc()?)
    }

    /// Returns the parameters of the context.
    #[must_use]
    pub fn parameters(&self) -> &Arc<Parameters> {
        &self.par
    }

    /// Returns the scheme of the context.
    #[must_use]
    pub fn kind(&self) -> SchemeKind {
        self.par.kind()
    }

    /// Returns the polynomial degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.par.degree()
    }

    /// Returns the maximum level.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.chain.len() - 1
    }

    /// SHA-256 of the canonical encoding of the parameters.
    #[must_use]
    pub const fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    /// Hexadecimal form of the fingerprint.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        to_hex(&self.fingerprint)
    }

    /// Returns the scale of fresh plaintexts of the approximate scheme.
    #[must_use]
    pub fn scale(&self) -> Option<f64> {
        match &self.tables {
            SchemeTables::ApproximateReal { scale, .. } => Some(*scale),
            SchemeTables::ExactInteger { .. } => None,
        }
    }

    /// Returns the ring context at a level, where level `i` has dropped the
    /// last `i` moduli.
    #[must_use]
    pub fn ctx_at_level(&self, level: usize) -> Option<&Arc<RqContext>> {
        self.chain.get(level)
    }

    pub(crate) fn check_same(&self, other: &Context) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(Error::ContextMismatch {
                expected: self.fingerprint_hex(),
                found: other.fingerprint_hex(),
            })
        }
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).join("")
}

#[cfg(test)]
mod tests {
    use super::{Context, SchemeTables};
    use crate::{ParametersBuilder, SchemeKind};
    use std::error::Error;

    #[test]
    fn exact_integer_tables() -> Result<(), Box<dyn Error>> {
        let mut builder = ParametersBuilder::new(SchemeKind::ExactInteger);
        builder.set_degree(2048).set_moduli_sizes(&[27, 27]);
        let ctx = Context::from_builder(&builder)?;
        assert_eq!(ctx.kind(), SchemeKind::ExactInteger);
        assert_eq!(ctx.max_level(), 1);
        assert!(ctx.scale().is_none());
        assert_eq!(ctx.ctx_at_level(1).map(|c| c.moduli().len()), Some(1));
        assert!(ctx.ctx_at_level(2).is_none());
        match &ctx.tables {
            SchemeTables::ExactInteger { plain, delta, .. } => {
                let q = ctx.ctx_at_level(0).ok_or("missing level")?.modulus();
                assert_eq!(delta, &(q / **plain));
            }
            SchemeTables::ApproximateReal { .. } => return Err("wrong tables".into()),
        }
        Ok(())
    }

    #[test]
    fn approximate_real_tables() -> Result<(), Box<dyn Error>> {
        let mut builder = ParametersBuilder::new(SchemeKind::ApproximateReal);
        builder
            .set_degree(4096)
            .set_moduli_sizes(&[50, 40])
            .set_scale_bits(40);
        let ctx = Context::from_builder(&builder)?;
        assert_eq!(ctx.scale(), Some(2f64.powi(40)));
        match &ctx.tables {
            SchemeTables::ApproximateReal { cosines, .. } => {
                assert_eq!(cosines.len(), 4096);
                assert_eq!(cosines[0], 1.0);
                assert!(cosines[2048].abs() < 1e-12);
            }
            SchemeTables::ExactInteger { .. } => return Err("wrong tables".into()),
        }
        Ok(())
    }

    #[test]
    fn fingerprints() -> Result<(), Box<dyn Error>> {
        let mut builder = ParametersBuilder::new(SchemeKind::ApproximateReal);
        builder.set_degree(4096).set_moduli_sizes(&[50, 40]);
        let ctx1 = Context::from_builder(&builder)?;
        let ctx2 = Context::from_builder(&builder)?;
        assert_eq!(ctx1, ctx2);
        assert_eq!(ctx1.fingerprint_hex().len(), 64);
        assert!(ctx1.check_same(&ctx2).is_ok());

        builder.set_scale_bits(30);
        let ctx3 = Context::from_builder(&builder)?;
        assert_ne!(ctx1, ctx3);
        assert!(ctx1.check_same(&ctx3).is_err());
        Ok(())
    }
}
