//! Create parameters for the homomorphic encryption schemes.

use crate::proto::{
    Parameters as ParametersProto, Scheme as SchemeProto, SecurityLevel as SecurityLevelProto,
};
use crate::{Error, ParametersError, Result, SchemeKind, SecurityLevel, SerializationError};
use henum_math::{ntt::supports_ntt, zq::primes::generate_prime};
use itertools::Itertools;
use prost::Message;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Default polynomial degree of both schemes.
pub const DEFAULT_DEGREE: usize = 8192;

/// Default variance of the centered binomial distribution.
pub const DEFAULT_VARIANCE: usize = 10;

/// Default size in bits of the generated plain modulus.
pub const DEFAULT_PLAIN_MODULUS_BITS: usize = 20;

/// Default number of bits of the scale of the approximate scheme.
pub const DEFAULT_SCALE_BITS: u32 = 40;

const MIN_DEGREE: usize = 1024;
const MAX_DEGREE: usize = 32768;
const MIN_MODULUS_BITS: usize = 10;
const MAX_MODULUS_BITS: usize = 60;
const MIN_SCALE_BITS: u32 = 20;
const MAX_SCALE_BITS: u32 = 60;

/// Parameters of a scheme instance.
///
/// Parameters are immutable once built, and are always valid for their
/// declared security level.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameters {
    kind: SchemeKind,

    /// Number of coefficients in a polynomial.
    degree: usize,

    /// Ciphertext moduli, the last one being dropped first by rescaling.
    moduli: Box<[u64]>,

    moduli_sizes: Box<[usize]>,

    /// Plaintext modulus of the exact scheme.
    plain_modulus: Option<u64>,

    /// Scale of the approximate scheme, in bits.
    scale_bits: Option<u32>,

    variance: usize,

    security: SecurityLevel,
}

impl Debug for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameters")
            .field("kind", &self.kind)
            .field("degree", &self.degree)
            .field("moduli", &self.moduli)
            .field("plain_modulus", &self.plain_modulus)
            .field("scale_bits", &self.scale_bits)
            .finish()
    }
}

impl Parameters {
    /// Returns the scheme of these parameters.
    #[must_use]
    pub const fn kind(&self) -> SchemeKind {
        self.kind
    }

    /// Returns the underlying polynomial degree
    #[must_use]
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// Returns a reference to the ciphertext moduli
    #[must_use]
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the sizes of the ciphertext moduli
    #[must_use]
    pub fn moduli_sizes(&self) -> &[usize] {
        &self.moduli_sizes
    }

    /// Returns the plaintext modulus of the exact scheme.
    #[must_use]
    pub const fn plain_modulus(&self) -> Option<u64> {
        self.plain_modulus
    }

    /// Returns the number of bits of the scale of the approximate scheme.
    #[must_use]
    pub const fn scale_bits(&self) -> Option<u32> {
        self.scale_bits
    }

    /// Returns the variance of the error and secret distributions.
    #[must_use]
    pub const fn variance(&self) -> usize {
        self.variance
    }

    /// Returns the declared security level.
    #[must_use]
    pub const fn security(&self) -> SecurityLevel {
        self.security
    }

    /// Returns the maximum level allowed by these parameters.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Returns the total number of bits of the ciphertext modulus.
    #[must_use]
    pub fn total_bits(&self) -> usize {
        self.moduli_sizes.iter().sum()
    }

    /// Canonical encoding of the parameters.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        ParametersProto::from(self).encode_to_vec()
    }

    /// SHA-256 of the canonical encoding, which identifies a context.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        Sha256::digest(self.to_bytes()).into()
    }

    /// Decode and validate parameters from their canonical encoding.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self> {
        let proto: ParametersProto = Message::decode(bytes)
            .map_err(|e| Error::Serialization(SerializationError::Protobuf(e.to_string())))?;
        let malformed =
            |reason: String| Error::Serialization(SerializationError::MalformedPayload(reason));

        let kind = match SchemeProto::try_from(proto.scheme) {
            Ok(SchemeProto::ExactInteger) => SchemeKind::ExactInteger,
            Ok(SchemeProto::ApproximateReal) => SchemeKind::ApproximateReal,
            _ => {
                return Err(Error::Serialization(SerializationError::UnknownScheme(
                    proto.scheme,
                )))
            }
        };
        let security = SecurityLevelProto::try_from(proto.security)
            .map(SecurityLevel::from)
            .map_err(|_| malformed(format!("unknown security level {}", proto.security)))?;

        let mut builder = ParametersBuilder::new(kind);
        builder
            .set_degree(proto.degree as usize)
            .set_moduli(&proto.moduli)
            .set_variance(proto.variance as usize)
            .set_security_level(security);
        if proto.plain_modulus != 0 {
            builder.set_plain_modulus(proto.plain_modulus);
        }
        if proto.scale_bits != 0 {
            builder.set_scale_bits(proto.scale_bits);
        }
        builder.build().map_err(|e| malformed(e.to_string()))
    }
}

/// Builder for parameters of either scheme.
#[derive(Debug, Clone)]
pub struct ParametersBuilder {
    kind: SchemeKind,
    degree: usize,
    variance: usize,
    ciphertext_moduli: Vec<u64>,
    ciphertext_moduli_sizes: Vec<usize>,
    plain_modulus: Option<u64>,
    plain_modulus_bits: usize,
    scale_bits: Option<u32>,
    security: SecurityLevel,
}

impl ParametersBuilder {
    /// Creates a new instance of the builder for a scheme, with no degree
    /// and no moduli.
    #[must_use]
    pub fn new(kind: SchemeKind) -> Self {
        Self {
            kind,
            degree: Default::default(),
            variance: DEFAULT_VARIANCE,
            ciphertext_moduli: Default::default(),
            ciphertext_moduli_sizes: Default::default(),
            plain_modulus: None,
            plain_modulus_bits: DEFAULT_PLAIN_MODULUS_BITS,
            scale_bits: None,
            security: SecurityLevel::default(),
        }
    }

    /// Creates a builder preset with the default parameters of a scheme.
    #[must_use]
    pub fn with_defaults(kind: SchemeKind) -> Self {
        let mut builder = Self::new(kind);
        builder.set_degree(DEFAULT_DEGREE);
        match kind {
            SchemeKind::ExactInteger => builder.set_moduli_sizes(&[50, 30, 30, 50]),
            SchemeKind::ApproximateReal => builder
                .set_moduli_sizes(&[60, 40, 40])
                .set_scale_bits(DEFAULT_SCALE_BITS),
        };
        builder
    }

    /// Sets the polynomial degree.
    pub fn set_degree(&mut self, degree: usize) -> &mut Self {
        self.degree = degree;
        self
    }

    /// Sets the sizes of the ciphertext moduli.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        sizes.clone_into(&mut self.ciphertext_moduli_sizes);
        self
    }

    /// Sets the ciphertext moduli to use.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        moduli.clone_into(&mut self.ciphertext_moduli);
        self
    }

    /// Sets the plaintext modulus of the exact scheme.
    pub fn set_plain_modulus(&mut self, plain_modulus: u64) -> &mut Self {
        self.plain_modulus = Some(plain_modulus);
        self
    }

    /// Sets the size of the plaintext modulus to generate when none is set.
    pub fn set_plain_modulus_bits(&mut self, bits: usize) -> &mut Self {
        self.plain_modulus_bits = bits;
        self
    }

    /// Sets the scale of the approximate scheme, in bits.
    pub fn set_scale_bits(&mut self, scale_bits: u32) -> &mut Self {
        self.scale_bits = Some(scale_bits);
        self
    }

    /// Sets the error variance.
    pub fn set_variance(&mut self, variance: usize) -> &mut Self {
        self.variance = variance;
        self
    }

    /// Sets the security level that the parameters must reach.
    pub fn set_security_level(&mut self, security: SecurityLevel) -> &mut Self {
        self.security = security;
        self
    }

    /// Generate ciphertext moduli with the specified sizes
    fn generate_moduli(moduli_sizes: &[usize], degree: usize) -> Result<Vec<u64>> {
        let mut moduli = vec![];
        let mut upper_bounds: HashMap<usize, u64> = HashMap::new();
        for size in moduli_sizes {
            if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(size) {
                return Err(ParametersError::InvalidModulusSize(
                    *size,
                    MIN_MODULUS_BITS,
                    MAX_MODULUS_BITS,
                )
                .into());
            }

            let upper_bound = upper_bounds.entry(*size).or_insert(1 << size);
            let prime = generate_prime(*size, 2 * degree as u64, *upper_bound)
                .ok_or(ParametersError::NotEnoughPrimes(*size, degree))?;
            *upper_bound = prime;
            moduli.push(prime);
        }

        Ok(moduli)
    }

    fn check_moduli(moduli: &[u64], degree: usize) -> Result<()> {
        for (i, modulus) in moduli.iter().enumerate() {
            let size = 64 - modulus.leading_zeros() as usize;
            if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&size) {
                return Err(ParametersError::InvalidModulusSize(
                    size,
                    MIN_MODULUS_BITS,
                    MAX_MODULUS_BITS,
                )
                .into());
            }
            if !supports_ntt(*modulus, degree) {
                return Err(ParametersError::InvalidModulus(
                    *modulus,
                    format!("not a prime congruent to 1 modulo {}", 2 * degree),
                )
                .into());
            }
            if moduli[..i].contains(modulus) {
                return Err(ParametersError::InvalidModulus(
                    *modulus,
                    "appears more than once".to_string(),
                )
                .into());
            }
        }
        Ok(())
    }

    fn plain_modulus(&self, moduli: &[u64]) -> Result<u64> {
        let plain_modulus = match self.plain_modulus {
            Some(t) => t,
            None => generate_prime(
                self.plain_modulus_bits,
                2 * self.degree as u64,
                1 << self.plain_modulus_bits.min(62),
            )
            .ok_or(ParametersError::NotEnoughPrimes(
                self.plain_modulus_bits,
                self.degree,
            ))?,
        };

        if !(2..=(1 << 61)).contains(&plain_modulus) {
            return Err(ParametersError::InvalidPlaintext(format!(
                "The plain modulus {plain_modulus} must be between 2 and 2^61"
            ))
            .into());
        }
        if !supports_ntt(plain_modulus, self.degree) {
            return Err(ParametersError::InvalidPlaintext(format!(
                "The plain modulus {plain_modulus} must be a prime congruent to 1 modulo {}",
                2 * self.degree
            ))
            .into());
        }
        if moduli.iter().any(|qi| *qi <= plain_modulus) {
            return Err(ParametersError::InvalidPlaintext(format!(
                "The plain modulus {plain_modulus} must be smaller than every ciphertext modulus"
            ))
            .into());
        }
        Ok(plain_modulus)
    }

    /// Build a new `Parameters` inside an `Arc`.
    pub fn build_arc(&self) -> Result<Arc<Parameters>> {
        self.build().map(Arc::new)
    }

    /// Build a new `Parameters`.
    pub fn build(&self) -> Result<Parameters> {
        if !(MIN_DEGREE..=MAX_DEGREE).contains(&self.degree) || !self.degree.is_power_of_two() {
            return Err(ParametersError::InvalidDegree(self.degree).into());
        }

        if !(1..=16).contains(&self.variance) {
            return Err(ParametersError::InvalidVariance(self.variance).into());
        }

        // Check that one of `ciphertext_moduli` and `ciphertext_moduli_sizes` is
        // specified.
        if !self.ciphertext_moduli.is_empty() && !self.ciphertext_moduli_sizes.is_empty() {
            return Err(ParametersError::TooManySpecified(
                "Only one of `ciphertext_moduli` and `ciphertext_moduli_sizes` can be specified"
                    .to_string(),
            )
            .into());
        } else if self.ciphertext_moduli.is_empty() && self.ciphertext_moduli_sizes.is_empty() {
            return Err(ParametersError::TooFewSpecified(
                "One of `ciphertext_moduli` and `ciphertext_moduli_sizes` must be specified"
                    .to_string(),
            )
            .into());
        }

        // Get or generate the moduli
        let moduli = if self.ciphertext_moduli_sizes.is_empty() {
            Self::check_moduli(&self.ciphertext_moduli, self.degree)?;
            self.ciphertext_moduli.clone()
        } else {
            Self::generate_moduli(&self.ciphertext_moduli_sizes, self.degree)?
        };

        let required = match self.kind {
            SchemeKind::ExactInteger => 1,
            SchemeKind::ApproximateReal => 2,
        };
        if moduli.len() < required {
            return Err(
                ParametersError::ModulusChainTooShort(self.kind, required, moduli.len()).into(),
            );
        }

        // Recomputes the moduli sizes
        let moduli_sizes = moduli
            .iter()
            .map(|m| 64 - m.leading_zeros() as usize)
            .collect_vec();
        let total_bits = moduli_sizes.iter().sum::<usize>();
        let max_bits = self
            .security
            .max_modulus_bits(self.degree)
            .ok_or(ParametersError::InvalidDegree(self.degree))?;
        if total_bits > max_bits {
            return Err(ParametersError::InsecureParameters {
                degree: self.degree,
                total_bits,
                max_bits,
                level: self.security,
            }
            .into());
        }

        let (plain_modulus, scale_bits) = match self.kind {
            SchemeKind::ExactInteger => {
                if self.scale_bits.is_some() {
                    return Err(ParametersError::TooManySpecified(
                        "The exact_integer scheme does not use a scale".to_string(),
                    )
                    .into());
                }
                (Some(self.plain_modulus(&moduli)?), None)
            }
            SchemeKind::ApproximateReal => {
                if self.plain_modulus.is_some() {
                    return Err(ParametersError::TooManySpecified(
                        "The approximate_real scheme does not use a plain modulus".to_string(),
                    )
                    .into());
                }
                let scale_bits = self.scale_bits.unwrap_or(DEFAULT_SCALE_BITS);
                let max_scale_bits = MAX_SCALE_BITS.min(total_bits as u32 - 1);
                if !(MIN_SCALE_BITS..=max_scale_bits).contains(&scale_bits) {
                    return Err(ParametersError::InvalidScale(
                        scale_bits,
                        MIN_SCALE_BITS,
                        max_scale_bits,
                    )
                    .into());
                }
                (None, Some(scale_bits))
            }
        };

        Ok(Parameters {
            kind: self.kind,
            degree: self.degree,
            moduli: moduli.into(),
            moduli_sizes: moduli_sizes.into(),
            plain_modulus,
            scale_bits,
            variance: self.variance,
            security: self.security,
        })
    }
}

impl From<SchemeKind> for SchemeProto {
    fn from(kind: SchemeKind) -> Self {
        match kind {
            SchemeKind::ExactInteger => SchemeProto::ExactInteger,
            SchemeKind::ApproximateReal => SchemeProto::ApproximateReal,
        }
    }
}

impl From<SecurityLevel> for SecurityLevelProto {
    fn from(level: SecurityLevel) -> Self {
        match level {
            SecurityLevel::Tc128 => SecurityLevelProto::Tc128,
            SecurityLevel::Tc192 => SecurityLevelProto::Tc192,
            SecurityLevel::Tc256 => SecurityLevelProto::Tc256,
        }
    }
}

impl From<SecurityLevelProto> for SecurityLevel {
    fn from(level: SecurityLevelProto) -> Self {
        match level {
            SecurityLevelProto::Tc128 => SecurityLevel::Tc128,
            SecurityLevelProto::Tc192 => SecurityLevel::Tc192,
            SecurityLevelProto::Tc256 => SecurityLevel::Tc256,
        }
    }
}

impl From<&Parameters> for ParametersProto {
    fn from(par: &Parameters) -> Self {
        ParametersProto {
            scheme: SchemeProto::from(par.kind) as i32,
            degree: par.degree as u32,
            moduli: par.moduli.to_vec(),
            plain_modulus: par.plain_modulus.unwrap_or_default(),
            scale_bits: par.scale_bits.unwrap_or_default(),
            variance: par.variance as u32,
            security: SecurityLevelProto::from(par.security) as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Parameters, ParametersBuilder};
    use crate::{Error, ParametersError, SchemeKind, SecurityLevel};
    use std::error::Error as StdError;

    #[test]
    fn default_parameters() -> Result<(), Box<dyn StdError>> {
        let exact = ParametersBuilder::with_defaults(SchemeKind::ExactInteger).build()?;
        assert_eq!(exact.degree(), 8192);
        assert_eq!(exact.moduli_sizes(), &[50, 30, 30, 50]);
        assert_eq!(exact.total_bits(), 160);
        assert_eq!(exact.max_level(), 3);
        let t = exact.plain_modulus().ok_or("missing plain modulus")?;
        assert_eq!(t % (2 * 8192), 1);
        assert_eq!(64 - t.leading_zeros(), 20);
        assert!(exact.scale_bits().is_none());

        let approximate = ParametersBuilder::with_defaults(SchemeKind::ApproximateReal).build()?;
        assert_eq!(approximate.moduli_sizes(), &[60, 40, 40]);
        assert_eq!(approximate.scale_bits(), Some(40));
        assert!(approximate.plain_modulus().is_none());
        assert_eq!(approximate.variance(), 10);
        assert_eq!(approximate.security(), SecurityLevel::Tc128);
        Ok(())
    }

    #[test]
    fn generated_moduli_are_distinct() -> Result<(), Box<dyn StdError>> {
        let par = ParametersBuilder::new(SchemeKind::ExactInteger)
            .set_degree(4096)
            .set_moduli_sizes(&[30, 30, 30])
            .build()?;
        let moduli = par.moduli();
        assert!(moduli[0] > moduli[1] && moduli[1] > moduli[2]);
        assert!(moduli.iter().all(|m| m % 8192 == 1));
        Ok(())
    }

    #[test]
    fn invalid_parameters() {
        let mut builder = ParametersBuilder::new(SchemeKind::ExactInteger);
        builder.set_moduli_sizes(&[27]);

        builder.set_degree(512);
        assert_eq!(
            builder.build(),
            Err(Error::Parameters(ParametersError::InvalidDegree(512)))
        );
        builder.set_degree(3000);
        assert_eq!(
            builder.build(),
            Err(Error::Parameters(ParametersError::InvalidDegree(3000)))
        );

        builder.set_degree(1024).set_variance(0);
        assert_eq!(
            builder.build(),
            Err(Error::Parameters(ParametersError::InvalidVariance(0)))
        );
        builder.set_variance(10);

        builder.set_moduli(&[132120577]);
        assert!(matches!(
            builder.build(),
            Err(Error::Parameters(ParametersError::TooManySpecified(_)))
        ));
        builder.set_moduli(&[]).set_moduli_sizes(&[]);
        assert!(matches!(
            builder.build(),
            Err(Error::Parameters(ParametersError::TooFewSpecified(_)))
        ));

        builder.set_moduli_sizes(&[9]);
        assert_eq!(
            builder.build(),
            Err(Error::Parameters(ParametersError::InvalidModulusSize(9, 10, 60)))
        );

        builder.set_moduli_sizes(&[]).set_moduli(&[1153 * 2 + 1]);
        assert!(matches!(
            builder.build(),
            Err(Error::Parameters(ParametersError::InvalidModulus(..)))
        ));
    }

    #[test]
    fn insecure_parameters() {
        let e = ParametersBuilder::new(SchemeKind::ExactInteger)
            .set_degree(1024)
            .set_moduli_sizes(&[30, 30])
            .build();
        assert_eq!(
            e,
            Err(Error::Parameters(ParametersError::InsecureParameters {
                degree: 1024,
                total_bits: 60,
                max_bits: 27,
                level: SecurityLevel::Tc128,
            }))
        );

        let e = ParametersBuilder::with_defaults(SchemeKind::ExactInteger)
            .set_security_level(SecurityLevel::Tc256)
            .build();
        assert!(matches!(
            e,
            Err(Error::Parameters(ParametersError::InsecureParameters { max_bits: 118, .. }))
        ));
    }

    #[test]
    fn scheme_specific_rules() -> Result<(), Box<dyn StdError>> {
        let e = ParametersBuilder::new(SchemeKind::ApproximateReal)
            .set_degree(2048)
            .set_moduli_sizes(&[40])
            .build();
        assert_eq!(
            e,
            Err(Error::Parameters(ParametersError::ModulusChainTooShort(
                SchemeKind::ApproximateReal,
                2,
                1
            )))
        );

        let e = ParametersBuilder::new(SchemeKind::ApproximateReal)
            .set_degree(4096)
            .set_moduli_sizes(&[50, 40])
            .set_scale_bits(10)
            .build();
        assert!(matches!(
            e,
            Err(Error::Parameters(ParametersError::InvalidScale(10, 20, _)))
        ));

        let e = ParametersBuilder::new(SchemeKind::ApproximateReal)
            .set_degree(4096)
            .set_moduli_sizes(&[50, 40])
            .set_plain_modulus(65537)
            .build();
        assert!(matches!(
            e,
            Err(Error::Parameters(ParametersError::TooManySpecified(_)))
        ));

        // 65537 is a prime congruent to 1 modulo 2 * 2048, but larger than
        // the only 14-bit modulus 12289.
        let e = ParametersBuilder::new(SchemeKind::ExactInteger)
            .set_degree(2048)
            .set_moduli_sizes(&[14])
            .set_plain_modulus(65537)
            .build();
        assert!(matches!(
            e,
            Err(Error::Parameters(ParametersError::InvalidPlaintext(_)))
        ));

        // 1153 is prime but not congruent to 1 modulo 4096.
        let e = ParametersBuilder::new(SchemeKind::ExactInteger)
            .set_degree(2048)
            .set_moduli_sizes(&[27, 27])
            .set_plain_modulus(1153)
            .build();
        assert!(matches!(
            e,
            Err(Error::Parameters(ParametersError::InvalidPlaintext(_)))
        ));

        let par = ParametersBuilder::new(SchemeKind::ExactInteger)
            .set_degree(2048)
            .set_moduli_sizes(&[27, 27])
            .set_plain_modulus(65537)
            .build()?;
        assert_eq!(par.plain_modulus(), Some(65537));
        Ok(())
    }

    #[test]
    fn canonical_bytes() -> Result<(), Box<dyn StdError>> {
        for kind in SchemeKind::ALL {
            let par = ParametersBuilder::new(kind)
                .set_degree(4096)
                .set_moduli_sizes(&[50, 40])
                .build()?;
            let bytes = par.to_bytes();
            let decoded = Parameters::try_from_bytes(&bytes)?;
            assert_eq!(decoded, par);
            assert_eq!(decoded.fingerprint(), par.fingerprint());
        }

        let exact = ParametersBuilder::new(SchemeKind::ExactInteger)
            .set_degree(4096)
            .set_moduli_sizes(&[50, 40])
            .build()?;
        let approximate = ParametersBuilder::new(SchemeKind::ApproximateReal)
            .set_degree(4096)
            .set_moduli_sizes(&[50, 40])
            .build()?;
        assert_ne!(exact.fingerprint(), approximate.fingerprint());
        assert!(Parameters::try_from_bytes(&[0xff, 0xff]).is_err());
        Ok(())
    }
}
