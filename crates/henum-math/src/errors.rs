use thiserror::Error;

use crate::rq::Representation;

/// Result of the ring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors of the ring arithmetic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A modulus outside of `[2, 2^62)`, or one that lacks a required inverse.
    #[error("Invalid modulus: modulus {0} should be between 2 and (1 << 62) - 1.")]
    InvalidModulus(u64),

    /// Bytes that do not describe a polynomial of the expected context.
    #[error("{0}")]
    Serialization(String),

    /// A modulus switch from a context with a single modulus.
    #[error("This is the last context.")]
    NoMoreContext,

    /// A context that does not match the operand.
    #[error("Invalid context provided.")]
    InvalidContext,

    /// An operand in the wrong representation.
    #[error("Incorrect representation: got {0:?}, expected {1:?}.")]
    IncorrectRepresentation(Representation, Representation),

    /// Any other error.
    #[error("{0}")]
    Default(String),
}
