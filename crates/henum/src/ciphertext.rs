//! Ciphertexts of both schemes.

use crate::{Context, SchemeKind};
use henum_math::rq::Poly;
use std::sync::Arc;

/// A ciphertext (c0, c1), bound to exactly one context. The polynomials are
/// kept in NTT representation.
#[derive(Debug, Clone)]
pub struct Ciphertext {
    pub(crate) ctx: Arc<Context>,
    pub(crate) c: Vec<Poly>,
    /// Number of rescales already consumed.
    pub(crate) level: usize,
    /// Scale of the encrypted value; 1 for the exact scheme.
    pub(crate) scale: f64,
}

impl Ciphertext {
    /// Returns the context of the ciphertext.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns the scheme of the ciphertext.
    #[must_use]
    pub fn kind(&self) -> SchemeKind {
        self.ctx.kind()
    }

    /// Returns the level of the ciphertext.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Returns the scale of the ciphertext.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the polynomials of the ciphertext.
    #[must_use]
    pub fn polys(&self) -> &[Poly] {
        &self.c
    }
}

impl PartialEq for Ciphertext {
    fn eq(&self, other: &Self) -> bool {
        self.ctx == other.ctx
            && self.level == other.level
            && self.scale.to_bits() == other.scale.to_bits()
            && self.c == other.c
    }
}
