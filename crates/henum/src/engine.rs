//! The engine handle, which owns one context and one stable key pair per
//! scheme, and exposes the operations on serialized objects.

use crate::benchmark::{self, SweepOperation, SweepResult, ValueGenerator};
use crate::serialize::import_public_key;
use crate::traits::{Decoder, Encoder, FheDecrypter, FheEncrypter};
use crate::{
    evaluator, Ciphertext, Context, EngineConfig, Error, KeyPair, ParametersError, Plaintext,
    PublicKey, Result, SchemeConfig, SchemeKind, SecretKeyHandle, WireObject,
};
use itertools::Itertools;
use rand::rng;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Context and stable keys of a scheme.
struct SchemeState {
    ctx: Arc<Context>,
    keys: KeyPair,
}

#[derive(Default)]
struct SchemeSlot {
    config: Option<SchemeConfig>,
    state: OnceLock<SchemeState>,
    failure: Mutex<Option<Error>>,
}

impl SchemeSlot {
    fn record_failure(&self, error: Option<Error>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    fn failure(&self) -> Option<Error> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Handle on the engine.
///
/// The handle is created unready; [`EngineHandle::initialize`] builds the
/// configured schemes. Until one scheme is built, every operation returns
/// [`Error::NotInitialized`], as does a configured scheme still being built.
/// A scheme that failed or was never configured returns
/// [`Error::SchemeUnavailable`]. The handle is `Send + Sync` and meant to be
/// shared in an `Arc`.
pub struct EngineHandle {
    slots: [SchemeSlot; 2],
}

impl Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field(
                "ready",
                &SchemeKind::ALL
                    .into_iter()
                    .filter(|kind| self.is_scheme_ready(*kind))
                    .collect_vec(),
            )
            .finish_non_exhaustive()
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineHandle {
    /// Creates an unready engine. When a scheme is configured more than once,
    /// only its first configuration is used.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut slots: [SchemeSlot; 2] = Default::default();
        for scheme in config.schemes {
            let slot = &mut slots[slot_index(scheme.kind)];
            if slot.config.is_none() {
                slot.config = Some(scheme);
            } else {
                warn!(scheme = %scheme.kind, "ignoring duplicate scheme configuration");
            }
        }
        Self { slots }
    }

    fn slot(&self, kind: SchemeKind) -> &SchemeSlot {
        &self.slots[slot_index(kind)]
    }

    /// Build the context and the stable key pair of every configured scheme.
    ///
    /// A scheme that fails is recorded as unavailable and does not prevent
    /// the others from being built. Returns an error only when no configured
    /// scheme could be built. Schemes already built are left untouched.
    pub fn initialize(&self) -> Result<()> {
        let mut first_error = None;
        for kind in SchemeKind::ALL {
            let slot = self.slot(kind);
            let Some(config) = &slot.config else {
                continue;
            };
            if slot.state.get().is_some() {
                continue;
            }

            let start = Instant::now();
            match build_state(config) {
                Ok(state) => {
                    let par = state.ctx.parameters();
                    info!(
                        scheme = %kind,
                        degree = par.degree(),
                        moduli = ?par.moduli(),
                        plain_modulus = ?par.plain_modulus(),
                        scale_bits = ?par.scale_bits(),
                        context_id = %state.ctx.fingerprint_hex(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "scheme initialized"
                    );
                    // Another thread may have built the scheme concurrently.
                    let _ = slot.state.set(state);
                    slot.record_failure(None);
                }
                Err(e) => {
                    warn!(scheme = %kind, error = %e, "scheme failed to initialize");
                    slot.record_failure(Some(e.clone()));
                    first_error.get_or_insert(e);
                }
            }
        }

        if self.is_ready() {
            Ok(())
        } else {
            Err(first_error.unwrap_or_else(|| {
                ParametersError::TooFewSpecified("No scheme is configured".to_string()).into()
            }))
        }
    }

    /// Whether at least one scheme is built.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.slots.iter().any(|slot| slot.state.get().is_some())
    }

    /// Whether a scheme is built.
    #[must_use]
    pub fn is_scheme_ready(&self, kind: SchemeKind) -> bool {
        self.slot(kind).state.get().is_some()
    }

    /// Error that prevented a scheme from being built, if any.
    #[must_use]
    pub fn scheme_failure(&self, kind: SchemeKind) -> Option<Error> {
        self.slot(kind).failure()
    }

    fn state(&self, kind: SchemeKind) -> Result<&SchemeState> {
        let slot = self.slot(kind);
        if let Some(state) = slot.state.get() {
            return Ok(state);
        }
        // A configured scheme that has not failed may still be building.
        if !self.is_ready() || (slot.config.is_some() && slot.failure().is_none()) {
            Err(Error::NotInitialized)
        } else {
            Err(Error::SchemeUnavailable(kind))
        }
    }

    /// Returns the context of a scheme.
    pub fn context(&self, kind: SchemeKind) -> Result<Arc<Context>> {
        Ok(self.state(kind)?.ctx.clone())
    }

    /// Encrypt a scalar. With no public key, the stable public key of the
    /// engine is used; otherwise the key is imported from its blob.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn encrypt(&self, kind: SchemeKind, value: f64, public_key: Option<&str>) -> Result<String> {
        debug!(external_key = public_key.is_some(), "encrypt");
        let mut blobs = self.encrypt_values(kind, &[value], public_key)?;
        blobs.pop().ok_or(Error::EmptyInput("encrypt"))
    }

    /// Encrypt every scalar of a list under the same public key.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn encrypt_many(
        &self,
        kind: SchemeKind,
        values: &[f64],
        public_key: Option<&str>,
    ) -> Result<Vec<String>> {
        debug!(count = values.len(), external_key = public_key.is_some(), "encrypt_many");
        self.encrypt_values(kind, values, public_key)
    }

    fn encrypt_values(
        &self,
        kind: SchemeKind,
        values: &[f64],
        public_key: Option<&str>,
    ) -> Result<Vec<String>> {
        let state = self.state(kind)?;
        let imported: PublicKey;
        let pk = match public_key {
            Some(blob) => {
                imported = import_public_key(&state.ctx, blob)?;
                &imported
            }
            None => state.keys.public_key(),
        };

        let mut rng = rng();
        values
            .iter()
            .map(|value| {
                let pt = Plaintext::encode_scalar(&state.ctx, *value)?;
                Ok(pk.try_encrypt(&pt, &mut rng)?.to_blob())
            })
            .collect()
    }

    /// Decrypt a ciphertext blob with the secret key behind a handle.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn decrypt(&self, kind: SchemeKind, blob: &str, handle: &SecretKeyHandle) -> Result<f64> {
        debug!("decrypt");
        let state = self.state(kind)?;
        let sk = handle.key_for(&state.ctx)?;
        let ct = Ciphertext::from_blob(&state.ctx, blob)?;
        f64::decode_scalar(&sk.try_decrypt(&ct)?)
    }

    /// Add two ciphertext blobs.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn add(&self, kind: SchemeKind, a: &str, b: &str) -> Result<String> {
        debug!("add");
        let state = self.state(kind)?;
        let a = Ciphertext::from_blob(&state.ctx, a)?;
        let b = Ciphertext::from_blob(&state.ctx, b)?;
        Ok(evaluator::add(&a, &b)?.to_blob())
    }

    /// Sum ciphertext blobs from left to right.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn sum<S: AsRef<str>>(&self, kind: SchemeKind, blobs: &[S]) -> Result<String> {
        debug!(count = blobs.len(), "sum");
        let state = self.state(kind)?;
        let cts = parse_all(&state.ctx, blobs)?;
        Ok(evaluator::sum(&cts)?.to_blob())
    }

    /// Multiply a ciphertext blob of the approximate scheme by a scalar.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn multiply_plain(&self, kind: SchemeKind, blob: &str, scalar: f64) -> Result<String> {
        debug!("multiply_plain");
        let state = self.state(kind)?;
        let ct = Ciphertext::from_blob(&state.ctx, blob)?;
        Ok(evaluator::multiply_plain(&ct, scalar)?.to_blob())
    }

    /// Average ciphertext blobs of the approximate scheme.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn average<S: AsRef<str>>(&self, kind: SchemeKind, blobs: &[S]) -> Result<String> {
        debug!(count = blobs.len(), "average");
        let state = self.state(kind)?;
        let cts = parse_all(&state.ctx, blobs)?;
        Ok(evaluator::average(&cts)?.to_blob())
    }

    /// Export the stable public key of a scheme.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn export_public_key(&self, kind: SchemeKind) -> Result<String> {
        Ok(self.state(kind)?.keys.public_key().to_blob())
    }

    /// Export the parameters of a scheme, from which a peer can rebuild the
    /// same context.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn export_parameters(&self, kind: SchemeKind) -> Result<String> {
        Ok(self.state(kind)?.ctx.parameters().to_blob())
    }

    /// Issue a handle on the stable secret key of a scheme.
    #[instrument(skip_all, fields(scheme = %kind))]
    pub fn secret_key_handle(&self, kind: SchemeKind) -> Result<SecretKeyHandle> {
        Ok(self.state(kind)?.keys.secret_key_handle())
    }

    /// Sweep additions of the pairs (v, max_value - v) for v = step, 2 *
    /// step, ... up to `max_value`.
    pub fn run_benchmark(&self, kind: SchemeKind, max_value: f64, step: f64) -> Result<SweepResult> {
        self.run_benchmark_with(
            kind,
            &ValueGenerator::Linear { max_value, step },
            SweepOperation::Add,
        )
    }

    /// Sweep an operation over generated pairs, with a key pair dedicated to
    /// the sweep.
    #[instrument(skip_all, fields(scheme = %kind, operation = %operation))]
    pub fn run_benchmark_with(
        &self,
        kind: SchemeKind,
        generator: &ValueGenerator,
        operation: SweepOperation,
    ) -> Result<SweepResult> {
        let state = self.state(kind)?;
        benchmark::run_sweep(&state.ctx, generator, operation, &mut rng())
    }
}

const fn slot_index(kind: SchemeKind) -> usize {
    match kind {
        SchemeKind::ExactInteger => 0,
        SchemeKind::ApproximateReal => 1,
    }
}

fn build_state(config: &SchemeConfig) -> Result<SchemeState> {
    let par = Arc::new(config.to_parameters()?);
    let ctx = Context::new_arc(&par)?;
    let keys = KeyPair::generate(&ctx, &mut rng())?;
    Ok(SchemeState { ctx, keys })
}

fn parse_all<S: AsRef<str>>(ctx: &Arc<Context>, blobs: &[S]) -> Result<Vec<Ciphertext>> {
    blobs
        .iter()
        .map(|blob| Ciphertext::from_blob(ctx, blob.as_ref()))
        .collect()
}
