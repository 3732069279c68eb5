//! Traits associated with polynomials.

use super::{Context, Representation};
use crate::Result;
use std::sync::Arc;

/// Conversions to create polynomials.
///
/// `TryFrom` cannot carry the context and the target representation, hence a
/// dedicated trait.
pub trait TryConvertFrom<T>
where
    Self: Sized,
{
    /// Attempt to convert the `value` into a polynomial with a specific
    /// context and representation.
    fn try_convert_from(
        value: T,
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self>;
}
