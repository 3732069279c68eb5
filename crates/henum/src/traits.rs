//! Traits at the seams between the codec, the keys, and the ciphertexts.

use crate::{Context, Result};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// Encode a scalar into a plaintext of a context.
pub trait Encoder
where
    Self: Sized,
{
    /// Attempt to encode a scalar in slot 0.
    fn encode_scalar(ctx: &Arc<Context>, value: f64) -> Result<Self>;
}

/// Decode the scalar held in slot 0 of a plaintext.
pub trait Decoder<P>
where
    Self: Sized,
{
    /// Attempt to decode a plaintext.
    fn decode_scalar(pt: &P) -> Result<Self>;
}

/// Encrypt a plaintext into a ciphertext.
pub trait FheEncrypter<P, C> {
    /// Try to encrypt a plaintext.
    fn try_encrypt<R: RngCore + CryptoRng>(&self, pt: &P, rng: &mut R) -> Result<C>;
}

/// Decrypt a ciphertext into a plaintext.
pub trait FheDecrypter<P, C> {
    /// Try to decrypt a ciphertext.
    fn try_decrypt(&self, ct: &C) -> Result<P>;
}
