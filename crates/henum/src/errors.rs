use crate::{SchemeKind, SecurityLevel};
use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Indicates a parameter error.
    #[error("{0}")]
    Parameters(ParametersError),

    /// Indicates that the engine has not been initialized yet.
    #[error("The engine is not initialized")]
    NotInitialized,

    /// Indicates that the requested scheme name is not known.
    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    /// Indicates a serialization error.
    #[error("Serialization error: {0}")]
    Serialization(SerializationError),

    /// Indicates that an object was produced under another context.
    #[error("Context mismatch: expected {expected}, found {found}")]
    ContextMismatch {
        /// Fingerprint of the local context.
        expected: String,
        /// Fingerprint carried by the object.
        found: String,
    },

    /// Indicates that an operation is not available for a scheme.
    #[error("Operation `{operation}` is not supported by the {scheme} scheme")]
    UnsupportedOperation {
        /// Name of the operation.
        operation: &'static str,
        /// Scheme it was requested on.
        scheme: SchemeKind,
    },

    /// Indicates that an operation received no input.
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// Indicates that a scheme is not configured, or failed to initialize.
    #[error("The {0} scheme is unavailable")]
    SchemeUnavailable(SchemeKind),

    /// Indicates that a value cannot be encoded.
    #[error("Value {value} is out of range [{min}, {max}]")]
    ValueOutOfRange {
        /// The offending value.
        value: f64,
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },

    /// Indicates that two ciphertexts are at different levels.
    #[error("Level mismatch: {0} and {1}")]
    LevelMismatch(usize, usize),

    /// Indicates that two ciphertexts have different scales.
    #[error("Scale mismatch: {0} and {1}")]
    ScaleMismatch(f64, f64),

    /// Indicates that there is no modulus left to rescale.
    #[error("No modulus left to rescale")]
    LevelExhausted,

    /// Indicates that key material does not belong to the scheme or context.
    #[error("Key does not match the scheme context")]
    KeyMismatch,

    /// Indicates that an error from the underlying mathematical library was
    /// encountered.
    #[error("{0}")]
    Math(henum_math::Error),

    /// Indicates that a blocking task could not complete.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<henum_math::Error> for Error {
    fn from(e: henum_math::Error) -> Self {
        Error::Math(e)
    }
}

impl From<ParametersError> for Error {
    fn from(e: ParametersError) -> Self {
        Error::Parameters(e)
    }
}

impl From<SerializationError> for Error {
    fn from(e: SerializationError) -> Self {
        Error::Serialization(e)
    }
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParametersError {
    /// Indicates that the degree is invalid.
    #[error("Invalid degree: {0} is not a power of 2 between 1024 and 32768")]
    InvalidDegree(usize),

    /// Indicates that the moduli sizes are invalid.
    #[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
    InvalidModulusSize(usize, usize, usize),

    /// Indicates that an explicit modulus cannot be used.
    #[error("Invalid modulus {0}: {1}")]
    InvalidModulus(u64, String),

    /// Indicates that the modulus chain is too short for the scheme.
    #[error("The {0} scheme requires at least {1} moduli, found {2}")]
    ModulusChainTooShort(SchemeKind, usize, usize),

    /// Indicates that there exists not enough primes of this size.
    #[error("Not enough primes of size {0} for polynomials of degree {1}")]
    NotEnoughPrimes(usize, usize),

    /// Indicates that the parameters do not reach the requested security.
    #[error(
        "Insecure parameters: {total_bits} modulus bits exceed {max_bits} for degree {degree} at {level}"
    )]
    InsecureParameters {
        /// Polynomial degree.
        degree: usize,
        /// Total number of bits of the modulus chain.
        total_bits: usize,
        /// Maximum number of bits for this degree and level.
        max_bits: usize,
        /// Requested security level.
        level: SecurityLevel,
    },

    /// Indicates that the plaintext is invalid.
    #[error("{0}")]
    InvalidPlaintext(String),

    /// Indicates that the scale is invalid.
    #[error("Invalid scale: {0} bits, expected an integer between {1} and {2}")]
    InvalidScale(u32, u32, u32),

    /// Indicates that the variance is invalid.
    #[error("Invalid variance: {0}, expected an integer between 1 and 16")]
    InvalidVariance(usize),

    /// Indicates that too many parameters were specified.
    #[error("{0}")]
    TooManySpecified(String),

    /// Indicates that too few parameters were specified.
    #[error("{0}")]
    TooFewSpecified(String),

    /// Indicates that a configuration could not be read.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Separate enum to indicate why a serialized object was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerializationError {
    /// The blob is not valid base64.
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// The length prefix announces more bytes than available.
    #[error("Truncated envelope: expected {expected} bytes, found {found}")]
    Truncated {
        /// Announced length.
        expected: usize,
        /// Available length.
        found: usize,
    },

    /// Bytes remain after the envelope.
    #[error("{0} trailing bytes after the envelope")]
    TrailingBytes(usize),

    /// The protobuf decoding failed.
    #[error("Protobuf decoding failed: {0}")]
    Protobuf(String),

    /// The envelope version is not supported.
    #[error("Unsupported version {0}")]
    UnsupportedVersion(u32),

    /// The object kind is unknown.
    #[error("Unknown object kind {0}")]
    UnknownObjectKind(i32),

    /// The object kind is not the requested one.
    #[error("Unexpected object kind: expected {expected}, found {found}")]
    UnexpectedObjectKind {
        /// Requested kind.
        expected: &'static str,
        /// Kind in the envelope.
        found: &'static str,
    },

    /// The scheme tag is unknown.
    #[error("Unknown scheme tag {0}")]
    UnknownScheme(i32),

    /// The payload digest does not match.
    #[error("Payload digest mismatch")]
    DigestMismatch,

    /// The payload does not describe a valid object.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

#[cfg(test)]
mod tests {
    use crate::{Error, ParametersError, SchemeKind, SecurityLevel, SerializationError};

    #[test]
    fn error_strings() {
        assert_eq!(
            Error::Math(henum_math::Error::InvalidContext).to_string(),
            henum_math::Error::InvalidContext.to_string()
        );
        assert_eq!(
            Error::NotInitialized.to_string(),
            "The engine is not initialized"
        );
        assert_eq!(
            Error::UnknownScheme("bgv".to_string()).to_string(),
            "Unknown scheme: bgv"
        );
        assert_eq!(
            Error::UnsupportedOperation {
                operation: "multiply_plain",
                scheme: SchemeKind::ExactInteger
            }
            .to_string(),
            "Operation `multiply_plain` is not supported by the exact_integer scheme"
        );
        assert_eq!(
            Error::EmptyInput("sum").to_string(),
            "Empty input: sum"
        );
        assert_eq!(
            Error::SchemeUnavailable(SchemeKind::ApproximateReal).to_string(),
            "The approximate_real scheme is unavailable"
        );
        assert_eq!(
            Error::ValueOutOfRange {
                value: 10.0,
                min: -3.0,
                max: 3.0
            }
            .to_string(),
            "Value 10 is out of range [-3, 3]"
        );
        assert_eq!(
            Error::Parameters(ParametersError::InvalidDegree(10)).to_string(),
            ParametersError::InvalidDegree(10).to_string()
        );
        assert_eq!(
            Error::Serialization(SerializationError::DigestMismatch).to_string(),
            "Serialization error: Payload digest mismatch"
        );
    }

    #[test]
    fn parameters_error_strings() {
        assert_eq!(
            ParametersError::InvalidDegree(10).to_string(),
            "Invalid degree: 10 is not a power of 2 between 1024 and 32768"
        );
        assert_eq!(
            ParametersError::InvalidModulusSize(1, 2, 3).to_string(),
            "Invalid modulus size: 1, expected an integer between 2 and 3"
        );
        assert_eq!(
            ParametersError::NotEnoughPrimes(1, 2).to_string(),
            "Not enough primes of size 1 for polynomials of degree 2"
        );
        assert_eq!(
            ParametersError::InsecureParameters {
                degree: 1024,
                total_bits: 60,
                max_bits: 27,
                level: SecurityLevel::Tc128
            }
            .to_string(),
            "Insecure parameters: 60 modulus bits exceed 27 for degree 1024 at tc128"
        );
        assert_eq!(
            ParametersError::TooManySpecified("test".to_string()).to_string(),
            "test"
        );
    }
}
