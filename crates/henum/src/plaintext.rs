//! Plaintexts holding one encoded scalar.

use crate::{Context, SchemeKind};
use henum_math::rq::Poly;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A plaintext of either scheme. The polynomial is kept in power basis, and
/// carries the scalar in slot 0 with every other slot at zero.
#[derive(Debug, Clone)]
pub struct Plaintext {
    pub(crate) ctx: Arc<Context>,
    pub(crate) poly: Poly,
    pub(crate) level: usize,
    pub(crate) scale: f64,
}

impl Plaintext {
    /// Returns the context of the plaintext.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns the scheme of the plaintext.
    #[must_use]
    pub fn kind(&self) -> SchemeKind {
        self.ctx.kind()
    }

    /// Returns the level of the plaintext.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Returns the scale of the plaintext; 1 for the exact scheme.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the underlying polynomial.
    #[must_use]
    pub const fn poly(&self) -> &Poly {
        &self.poly
    }
}

impl PartialEq for Plaintext {
    fn eq(&self, other: &Self) -> bool {
        self.ctx == other.ctx
            && self.level == other.level
            && self.scale.to_bits() == other.scale.to_bits()
            && self.poly == other.poly
    }
}

impl Zeroize for Plaintext {
    fn zeroize(&mut self) {
        self.poly.zeroize();
    }
}

impl Drop for Plaintext {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for Plaintext {}
