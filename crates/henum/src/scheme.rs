//! Scheme kinds and security levels.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The homomorphic encryption schemes supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    /// BFV-style arithmetic on integers modulo a plaintext modulus.
    ExactInteger,
    /// CKKS-style arithmetic on reals at a fixed scale.
    ApproximateReal,
}

impl SchemeKind {
    /// Every supported scheme.
    pub const ALL: [SchemeKind; 2] = [SchemeKind::ExactInteger, SchemeKind::ApproximateReal];

    /// Canonical name of the scheme.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::ExactInteger => "exact_integer",
            SchemeKind::ApproximateReal => "approximate_real",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bfv" | "exact_integer" | "exact" => Ok(SchemeKind::ExactInteger),
            "ckks" | "approximate_real" | "approximate" => Ok(SchemeKind::ApproximateReal),
            _ => Err(Error::UnknownScheme(s.to_string())),
        }
    }
}

/// Classical security levels of the homomorphic encryption standard
/// <https://homomorphicencryption.org/standard>.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// 128 bits of classical security.
    #[default]
    Tc128,
    /// 192 bits of classical security.
    Tc192,
    /// 256 bits of classical security.
    Tc256,
}

impl SecurityLevel {
    /// Maximum number of bits of the ciphertext modulus for a polynomial
    /// degree, or None when the degree is not covered by the standard.
    #[must_use]
    pub const fn max_modulus_bits(&self, degree: usize) -> Option<usize> {
        let column = match self {
            SecurityLevel::Tc128 => 0,
            SecurityLevel::Tc192 => 1,
            SecurityLevel::Tc256 => 2,
        };
        let row: [usize; 3] = match degree {
            1024 => [27, 19, 14],
            2048 => [54, 37, 29],
            4096 => [109, 75, 58],
            8192 => [218, 152, 118],
            16384 => [438, 305, 237],
            32768 => [881, 611, 476],
            _ => return None,
        };
        Some(row[column])
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecurityLevel::Tc128 => "tc128",
            SecurityLevel::Tc192 => "tc192",
            SecurityLevel::Tc256 => "tc256",
        })
    }
}
