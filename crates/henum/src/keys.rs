//! Key material: secret keys, public keys, key pairs, and secret key
//! handles.

use crate::context::SchemeTables;
use crate::traits::{FheDecrypter, FheEncrypter};
use crate::{Ciphertext, Context, Error, Plaintext, Result, SchemeKind};
use henum_math::{
    rq::{traits::TryConvertFrom, Context as RqContext, Poly, Representation},
    util::sample_vec_cbd,
};
use itertools::Itertools;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore};
use std::fmt::Debug;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Secret key of either scheme.
///
/// The coefficients are zeroized on drop, and the key has no serialization.
#[derive(PartialEq, Eq)]
pub struct SecretKey {
    pub(crate) ctx: Arc<Context>,
    coeffs: Box<[i64]>,
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("ctx", &self.ctx.fingerprint_hex())
            .finish_non_exhaustive()
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl SecretKey {
    /// Generate a random [`SecretKey`] with centered binomial coefficients.
    pub fn random<R: RngCore + CryptoRng>(ctx: &Arc<Context>, rng: &mut R) -> Result<Self> {
        let coeffs = sample_vec_cbd(ctx.degree(), ctx.parameters().variance(), rng)
            .map_err(|e| Error::Math(henum_math::Error::Default(e.to_string())))?;
        Ok(Self {
            ctx: ctx.clone(),
            coeffs: coeffs.into_boxed_slice(),
        })
    }

    /// The secret polynomial in NTT representation in a ring context.
    fn poly_in(&self, ctx: &Arc<RqContext>) -> Result<Zeroizing<Poly>> {
        let mut s = Zeroizing::new(Poly::try_convert_from(
            self.coeffs.as_ref(),
            ctx,
            Representation::PowerBasis,
        )?);
        s.change_representation(Representation::Ntt);
        Ok(s)
    }
}

impl FheDecrypter<Plaintext, Ciphertext> for SecretKey {
    fn try_decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        if self.ctx != ct.ctx {
            return Err(Error::KeyMismatch);
        }

        let ctx = ct.c[0].ctx();
        let s = self.poly_in(ctx)?;
        let mut c = Zeroizing::new(&ct.c[1] * &*s);
        *c += &ct.c[0];
        c.change_representation(Representation::PowerBasis);

        let poly = match &self.ctx.tables {
            SchemeTables::ExactInteger { plain, .. } => {
                // round(t * x / q) mod t
                let q = ctx.modulus();
                let half_q = q >> 1usize;
                let t = BigUint::from(**plain);
                let m = Zeroizing::new(
                    Vec::<BigUint>::from(&*c)
                        .iter()
                        .map(|x| (((x * &t) + &half_q) / q % &t).to_u64().unwrap_or_default())
                        .collect_vec(),
                );
                Poly::try_convert_from(m.as_slice(), ctx, Representation::PowerBasis)?
            }
            SchemeTables::ApproximateReal { .. } => (*c).clone(),
        };

        Ok(Plaintext {
            ctx: ct.ctx.clone(),
            poly,
            level: ct.level,
            scale: ct.scale,
        })
    }
}

/// Public key of either scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) ctx: Arc<Context>,
    pub(crate) pk0: Poly,
    pub(crate) pk1: Poly,
}

impl PublicKey {
    /// Generate a new [`PublicKey`] from a [`SecretKey`], as
    /// (-(a * s) + e, a) with `a` uniform and `e` small.
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let ctx = sk
            .ctx
            .ctx_at_level(0)
            .ok_or(Error::Math(henum_math::Error::InvalidContext))?;
        let s = sk.poly_in(ctx)?;
        let a = Poly::random(ctx, Representation::Ntt, rng);
        let a_s = Zeroizing::new(&a * &*s);
        let mut b = Poly::small(
            ctx,
            Representation::Ntt,
            sk.ctx.parameters().variance(),
            rng,
        )?;
        b -= &*a_s;

        Ok(Self {
            ctx: sk.ctx.clone(),
            pk0: b,
            pk1: a,
        })
    }

    /// Returns the context of the public key.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }
}

impl FheEncrypter<Plaintext, Ciphertext> for PublicKey {
    fn try_encrypt<R: RngCore + CryptoRng>(
        &self,
        pt: &Plaintext,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        self.ctx.check_same(&pt.ctx)?;
        if pt.level != 0 {
            return Err(Error::LevelMismatch(pt.level, 0));
        }

        let ctx = self.pk0.ctx();
        let variance = self.ctx.parameters().variance();
        let u = Zeroizing::new(Poly::small(ctx, Representation::Ntt, variance, rng)?);
        let e1 = Zeroizing::new(Poly::small(ctx, Representation::Ntt, variance, rng)?);
        let e2 = Zeroizing::new(Poly::small(ctx, Representation::Ntt, variance, rng)?);

        let mut m = Zeroizing::new(pt.poly.clone());
        if let SchemeTables::ExactInteger { delta, .. } = &self.ctx.tables {
            *m *= delta;
        }
        m.change_representation(Representation::Ntt);

        let mut c0 = &*u * &self.pk0;
        c0 += &*e1;
        c0 += &*m;
        let mut c1 = &*u * &self.pk1;
        c1 += &*e2;

        Ok(Ciphertext {
            ctx: self.ctx.clone(),
            c: vec![c0, c1],
            level: 0,
            scale: pt.scale,
        })
    }
}

/// A public key and its secret key.
#[derive(Debug)]
pub struct KeyPair {
    public_key: PublicKey,
    secret_key: Arc<SecretKey>,
}

impl KeyPair {
    /// Generate a fresh key pair for a context.
    pub fn generate<R: RngCore + CryptoRng>(ctx: &Arc<Context>, rng: &mut R) -> Result<Self> {
        let secret_key = SecretKey::random(ctx, rng)?;
        let public_key = PublicKey::new(&secret_key, rng)?;
        Ok(Self {
            public_key,
            secret_key: Arc::new(secret_key),
        })
    }

    /// Returns the public key, which can be freely exported.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the secret key.
    #[must_use]
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Issue a handle on the secret key of this pair.
    #[must_use]
    pub fn secret_key_handle(&self) -> SecretKeyHandle {
        SecretKeyHandle {
            kind: self.secret_key.ctx.kind(),
            context_id: *self.secret_key.ctx.fingerprint(),
            key: self.secret_key.clone(),
        }
    }
}

/// A key pair that only lives inside [`with_ephemeral_keys`].
///
/// Unlike [`KeyPair`], it cannot issue [`SecretKeyHandle`]s, so the secret
/// key is only reachable through the borrow lent to the closure.
#[derive(Debug)]
pub struct EphemeralKeys {
    public_key: PublicKey,
    secret_key: SecretKey,
}

impl EphemeralKeys {
    /// Returns the public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the secret key.
    #[must_use]
    pub const fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }
}

/// Generate a key pair, lend it to `f`, and drop it when `f` returns. The
/// secret key is zeroized before this function returns.
///
/// Nothing derived from the secret key can outlive the call:
///
/// ```compile_fail
/// # use henum::{with_ephemeral_keys, Context, ParametersBuilder, SchemeKind};
/// # let builder = ParametersBuilder::with_defaults(SchemeKind::ExactInteger);
/// # let ctx = Context::from_builder(&builder).unwrap();
/// let sk = with_ephemeral_keys(&ctx, &mut rand::rng(), |keys, _| Ok(keys.secret_key()));
/// ```
pub fn with_ephemeral_keys<R, T, F>(ctx: &Arc<Context>, rng: &mut R, f: F) -> Result<T>
where
    R: RngCore + CryptoRng,
    F: FnOnce(&EphemeralKeys, &mut R) -> Result<T>,
{
    let secret_key = SecretKey::random(ctx, rng)?;
    let public_key = PublicKey::new(&secret_key, rng)?;
    let keys = EphemeralKeys {
        public_key,
        secret_key,
    };
    f(&keys, rng)
}

/// Capability to decrypt with the secret key of one scheme. Handles are
/// cheap to clone and cannot be serialized.
#[derive(Clone)]
pub struct SecretKeyHandle {
    kind: SchemeKind,
    context_id: [u8; 32],
    key: Arc<SecretKey>,
}

impl Debug for SecretKeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeyHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl SecretKeyHandle {
    /// Returns the scheme of the key.
    #[must_use]
    pub const fn kind(&self) -> SchemeKind {
        self.kind
    }

    /// Returns the fingerprint of the context of the key.
    #[must_use]
    pub const fn context_id(&self) -> &[u8; 32] {
        &self.context_id
    }

    /// Returns the secret key if the handle matches the scheme and context.
    pub(crate) fn key_for(&self, ctx: &Context) -> Result<&SecretKey> {
        if self.kind == ctx.kind() && &self.context_id == ctx.fingerprint() {
            Ok(&self.key)
        } else {
            Err(Error::KeyMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{with_ephemeral_keys, KeyPair, SecretKey};
    use crate::traits::{Decoder, Encoder, FheDecrypter, FheEncrypter};
    use crate::{Context, Error, ParametersBuilder, Plaintext, SchemeKind};
    use rand::rng;
    use std::{error::Error as StdError, sync::Arc};

    fn exact_context() -> Result<Arc<Context>, Box<dyn StdError>> {
        let mut builder = ParametersBuilder::new(SchemeKind::ExactInteger);
        builder.set_degree(2048).set_moduli_sizes(&[27, 27]);
        Ok(Context::from_builder(&builder)?)
    }

    #[test]
    fn keygen_encrypt_decrypt() -> Result<(), Box<dyn StdError>> {
        let mut rng = rng();
        let ctx = exact_context()?;
        let keys = KeyPair::generate(&ctx, &mut rng)?;
        for value in [0.0, 1.0, -1.0, 12345.0, -54321.0] {
            let pt = Plaintext::encode_scalar(&ctx, value)?;
            let ct = keys.public_key().try_encrypt(&pt, &mut rng)?;
            let decrypted = keys.secret_key().try_decrypt(&ct)?;
            assert_eq!(f64::decode_scalar(&decrypted)?, value);
        }
        Ok(())
    }

    #[test]
    fn key_mismatch() -> Result<(), Box<dyn StdError>> {
        let mut rng = rng();
        let ctx = exact_context()?;
        let keys = KeyPair::generate(&ctx, &mut rng)?;
        let pt = Plaintext::encode_scalar(&ctx, 3.0)?;
        let ct = keys.public_key().try_encrypt(&pt, &mut rng)?;

        let mut builder = ParametersBuilder::new(SchemeKind::ExactInteger);
        builder.set_degree(2048).set_moduli_sizes(&[26, 26]);
        let other = Context::from_builder(&builder)?;
        let other_sk = SecretKey::random(&other, &mut rng)?;
        assert_eq!(other_sk.try_decrypt(&ct), Err(Error::KeyMismatch));

        let handle = keys.secret_key_handle();
        assert_eq!(handle.kind(), SchemeKind::ExactInteger);
        assert_eq!(handle.context_id(), ctx.fingerprint());
        assert!(handle.key_for(&ctx).is_ok());
        assert_eq!(handle.key_for(&other).err(), Some(Error::KeyMismatch));
        Ok(())
    }

    #[test]
    fn ephemeral_keys() -> Result<(), Box<dyn StdError>> {
        let mut rng = rng();
        let ctx = exact_context()?;
        let decrypted = with_ephemeral_keys(&ctx, &mut rng, |keys, rng| {
            let pt = Plaintext::encode_scalar(&ctx, 42.0)?;
            let ct = keys.public_key().try_encrypt(&pt, rng)?;
            f64::decode_scalar(&keys.secret_key().try_decrypt(&ct)?)
        })?;
        assert_eq!(decrypted, 42.0);
        Ok(())
    }

    #[test]
    fn ephemeral_ciphertexts_outlive_their_keys() -> Result<(), Box<dyn StdError>> {
        let mut rng = rng();
        let ctx = exact_context()?;
        let ct = with_ephemeral_keys(&ctx, &mut rng, |keys, rng| {
            let pt = Plaintext::encode_scalar(&ctx, 41.0)?;
            let ct = keys.public_key().try_encrypt(&pt, rng)?;
            assert_eq!(f64::decode_scalar(&keys.secret_key().try_decrypt(&ct)?)?, 41.0);
            Ok(ct)
        })?;

        // Only the ciphertext leaves the closure; no other key of the same
        // context recovers its value.
        let stable = KeyPair::generate(&ctx, &mut rng)?;
        let decrypted = stable.secret_key_handle().key_for(&ctx)?.try_decrypt(&ct)?;
        assert_ne!(f64::decode_scalar(&decrypted).ok(), Some(41.0));
        Ok(())
    }

    #[test]
    fn secret_key_debug_is_redacted() -> Result<(), Box<dyn StdError>> {
        let mut rng = rng();
        let ctx = exact_context()?;
        let keys = KeyPair::generate(&ctx, &mut rng)?;
        let debug = format!("{:?}", keys.secret_key());
        assert!(!debug.contains("coeffs"));
        assert!(format!("{:?}", keys.secret_key_handle()).contains("ExactInteger"));
        Ok(())
    }
}
