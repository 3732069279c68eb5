//! Engine configuration.
//!
//! A configuration lists the schemes to build at initialization. Every field
//! of a scheme except its kind is optional and falls back to the defaults of
//! [`ParametersBuilder::with_defaults`].

use crate::{Parameters, ParametersBuilder, ParametersError, Result, SchemeKind, SecurityLevel};
use serde::{Deserialize, Serialize};

/// Configuration of one scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemeConfig {
    /// Scheme to build.
    pub kind: SchemeKind,
    /// Polynomial degree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<usize>,
    /// Sizes in bits of the ciphertext moduli.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moduli_sizes: Option<Vec<usize>>,
    /// Explicit plaintext modulus of the exact scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_modulus: Option<u64>,
    /// Size in bits of the generated plaintext modulus of the exact scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_modulus_bits: Option<usize>,
    /// Number of bits of the scale of the approximate scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_bits: Option<u32>,
    /// Security level the parameters must reach.
    #[serde(default)]
    pub security: SecurityLevel,
    /// Variance of the error and secret distributions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance: Option<usize>,
}

impl SchemeConfig {
    /// Configuration of a scheme with every default.
    #[must_use]
    pub fn new(kind: SchemeKind) -> Self {
        Self {
            kind,
            degree: None,
            moduli_sizes: None,
            plain_modulus: None,
            plain_modulus_bits: None,
            scale_bits: None,
            security: SecurityLevel::default(),
            variance: None,
        }
    }

    /// Build the parameters described by this configuration.
    pub fn to_parameters(&self) -> Result<Parameters> {
        let mut builder = ParametersBuilder::with_defaults(self.kind);
        builder.set_security_level(self.security);
        if let Some(degree) = self.degree {
            builder.set_degree(degree);
        }
        if let Some(sizes) = &self.moduli_sizes {
            builder.set_moduli_sizes(sizes);
        }
        if let Some(t) = self.plain_modulus {
            builder.set_plain_modulus(t);
        }
        if let Some(bits) = self.plain_modulus_bits {
            builder.set_plain_modulus_bits(bits);
        }
        if let Some(bits) = self.scale_bits {
            builder.set_scale_bits(bits);
        }
        if let Some(variance) = self.variance {
            builder.set_variance(variance);
        }
        builder.build()
    }
}

/// Configuration of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Schemes to build, at most one per kind.
    pub schemes: Vec<SchemeConfig>,
}

impl Default for EngineConfig {
    /// Both schemes with their default parameters.
    fn default() -> Self {
        Self {
            schemes: SchemeKind::ALL.into_iter().map(SchemeConfig::new).collect(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    ///
    /// Returns an error if the JSON is invalid, or if a scheme is configured
    /// more than once.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ParametersError::InvalidConfiguration(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Returns the configuration of a scheme.
    #[must_use]
    pub fn scheme(&self, kind: SchemeKind) -> Option<&SchemeConfig> {
        self.schemes.iter().find(|s| s.kind == kind)
    }

    pub(crate) fn check(&self) -> Result<()> {
        for (i, scheme) in self.schemes.iter().enumerate() {
            if self.schemes[..i].iter().any(|s| s.kind == scheme.kind) {
                return Err(ParametersError::InvalidConfiguration(format!(
                    "The {} scheme is configured more than once",
                    scheme.kind
                ))
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, SchemeConfig};
    use crate::{Error, ParametersError, SchemeKind, SecurityLevel};
    use std::error::Error as StdError;

    #[test]
    fn default_config() -> Result<(), Box<dyn StdError>> {
        let config = EngineConfig::default();
        assert_eq!(config.schemes.len(), 2);

        let exact = config
            .scheme(SchemeKind::ExactInteger)
            .ok_or("missing scheme")?
            .to_parameters()?;
        assert_eq!(exact.degree(), 8192);
        assert_eq!(exact.moduli_sizes(), &[50, 30, 30, 50]);

        let approximate = config
            .scheme(SchemeKind::ApproximateReal)
            .ok_or("missing scheme")?
            .to_parameters()?;
        assert_eq!(approximate.moduli_sizes(), &[60, 40, 40]);
        assert_eq!(approximate.scale_bits(), Some(40));
        Ok(())
    }

    #[test]
    fn from_json() -> Result<(), Box<dyn StdError>> {
        let config = EngineConfig::from_json(
            r#"{
                "schemes": [
                    {"kind": "exact_integer", "degree": 2048, "moduli_sizes": [27, 27], "plain_modulus": 65537},
                    {"kind": "approximate_real", "degree": 4096, "moduli_sizes": [45, 30, 30], "scale_bits": 30, "security": "tc128"}
                ]
            }"#,
        )?;
        let exact = config.schemes[0].to_parameters()?;
        assert_eq!(exact.degree(), 2048);
        assert_eq!(exact.plain_modulus(), Some(65537));
        let approximate = config.schemes[1].to_parameters()?;
        assert_eq!(approximate.scale_bits(), Some(30));
        assert_eq!(approximate.security(), SecurityLevel::Tc128);

        let json = serde_json::to_string(&config)?;
        assert_eq!(EngineConfig::from_json(&json)?, config);
        Ok(())
    }

    #[test]
    fn invalid_json() {
        for json in [
            "{",
            r#"{"schemes": [{"kind": "bgv"}]}"#,
            r#"{"schemes": [{"kind": "exact", "degree": 2048}]}"#,
            r#"{"schemes": [{"kind": "exact_integer", "unknown": 1}]}"#,
            r#"{"schemes": [{"kind": "exact_integer"}, {"kind": "exact_integer"}]}"#,
        ] {
            assert!(matches!(
                EngineConfig::from_json(json),
                Err(Error::Parameters(ParametersError::InvalidConfiguration(_)))
            ));
        }
    }

    #[test]
    fn insecure_scheme() {
        let config = SchemeConfig {
            degree: Some(2048),
            ..SchemeConfig::new(SchemeKind::ExactInteger)
        };
        assert!(matches!(
            config.to_parameters(),
            Err(Error::Parameters(ParametersError::InsecureParameters { .. }))
        ));
    }
}
