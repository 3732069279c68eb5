//! Asynchronous adapter over [`EngineHandle`].
//!
//! Every operation runs on the blocking pool of the tokio runtime. Dropping
//! a future does not cancel its operation, whose result is then discarded.

use crate::benchmark::{SweepOperation, SweepResult, ValueGenerator};
use crate::{EngineConfig, EngineHandle, Error, Result, SchemeKind, SecretKeyHandle};
use std::sync::Arc;

/// Cloneable asynchronous engine.
#[derive(Debug, Clone)]
pub struct AsyncEngine {
    inner: Arc<EngineHandle>,
}

impl From<Arc<EngineHandle>> for AsyncEngine {
    fn from(inner: Arc<EngineHandle>) -> Self {
        Self { inner }
    }
}

impl AsyncEngine {
    /// Creates an unready engine.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineHandle::new(config)),
        }
    }

    /// Returns the underlying handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<EngineHandle> {
        &self.inner
    }

    async fn spawn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&EngineHandle) -> Result<T> + Send + 'static,
    {
        let engine = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&engine))
            .await
            .map_err(|e| Error::Runtime(e.to_string()))?
    }

    /// Like `spawn`, but fails immediately when the engine is not ready.
    async fn spawn_ready<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&EngineHandle) -> Result<T> + Send + 'static,
    {
        if !self.inner.is_ready() {
            return Err(Error::NotInitialized);
        }
        self.spawn(f).await
    }

    /// Build the configured schemes on the blocking pool.
    pub async fn initialize(&self) -> Result<()> {
        self.spawn(EngineHandle::initialize).await
    }

    /// Whether at least one scheme is built.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    /// See [`EngineHandle::encrypt`].
    pub async fn encrypt(
        &self,
        kind: SchemeKind,
        value: f64,
        public_key: Option<String>,
    ) -> Result<String> {
        self.spawn_ready(move |e| e.encrypt(kind, value, public_key.as_deref()))
            .await
    }

    /// See [`EngineHandle::encrypt_many`].
    pub async fn encrypt_many(
        &self,
        kind: SchemeKind,
        values: Vec<f64>,
        public_key: Option<String>,
    ) -> Result<Vec<String>> {
        self.spawn_ready(move |e| e.encrypt_many(kind, &values, public_key.as_deref()))
            .await
    }

    /// See [`EngineHandle::decrypt`].
    pub async fn decrypt(
        &self,
        kind: SchemeKind,
        blob: String,
        handle: SecretKeyHandle,
    ) -> Result<f64> {
        self.spawn_ready(move |e| e.decrypt(kind, &blob, &handle))
            .await
    }

    /// See [`EngineHandle::add`].
    pub async fn add(&self, kind: SchemeKind, a: String, b: String) -> Result<String> {
        self.spawn_ready(move |e| e.add(kind, &a, &b)).await
    }

    /// See [`EngineHandle::sum`].
    pub async fn sum(&self, kind: SchemeKind, blobs: Vec<String>) -> Result<String> {
        self.spawn_ready(move |e| e.sum(kind, &blobs)).await
    }

    /// See [`EngineHandle::multiply_plain`].
    pub async fn multiply_plain(&self, kind: SchemeKind, blob: String, scalar: f64) -> Result<String> {
        self.spawn_ready(move |e| e.multiply_plain(kind, &blob, scalar))
            .await
    }

    /// See [`EngineHandle::average`].
    pub async fn average(&self, kind: SchemeKind, blobs: Vec<String>) -> Result<String> {
        self.spawn_ready(move |e| e.average(kind, &blobs)).await
    }

    /// See [`EngineHandle::export_public_key`].
    pub async fn export_public_key(&self, kind: SchemeKind) -> Result<String> {
        self.spawn_ready(move |e| e.export_public_key(kind)).await
    }

    /// See [`EngineHandle::export_parameters`].
    pub async fn export_parameters(&self, kind: SchemeKind) -> Result<String> {
        self.spawn_ready(move |e| e.export_parameters(kind)).await
    }

    /// See [`EngineHandle::secret_key_handle`].
    pub fn secret_key_handle(&self, kind: SchemeKind) -> Result<SecretKeyHandle> {
        self.inner.secret_key_handle(kind)
    }

    /// See [`EngineHandle::run_benchmark`].
    pub async fn run_benchmark(
        &self,
        kind: SchemeKind,
        max_value: f64,
        step: f64,
    ) -> Result<SweepResult> {
        self.spawn_ready(move |e| e.run_benchmark(kind, max_value, step))
            .await
    }

    /// See [`EngineHandle::run_benchmark_with`].
    pub async fn run_benchmark_with(
        &self,
        kind: SchemeKind,
        generator: ValueGenerator,
        operation: SweepOperation,
    ) -> Result<SweepResult> {
        self.spawn_ready(move |e| e.run_benchmark_with(kind, &generator, operation))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::AsyncEngine;
    use crate::{EngineConfig, Error, SchemeConfig, SchemeKind};
    use std::error::Error as StdError;

    fn config() -> EngineConfig {
        EngineConfig {
            schemes: vec![
                SchemeConfig {
                    degree: Some(2048),
                    moduli_sizes: Some(vec![27, 27]),
                    ..SchemeConfig::new(SchemeKind::ExactInteger)
                },
                SchemeConfig {
                    degree: Some(8192),
                    moduli_sizes: Some(vec![60, 40, 40]),
                    scale_bits: Some(40),
                    ..SchemeConfig::new(SchemeKind::ApproximateReal)
                },
            ],
        }
    }

    #[tokio::test]
    async fn not_initialized() {
        let engine = AsyncEngine::new(config());
        assert!(!engine.is_ready());
        assert_eq!(
            engine.encrypt(SchemeKind::ExactInteger, 1.0, None).await,
            Err(Error::NotInitialized)
        );
        assert_eq!(
            engine.sum(SchemeKind::ExactInteger, vec![]).await,
            Err(Error::NotInitialized)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests() -> Result<(), Box<dyn StdError>> {
        let engine = AsyncEngine::new(config());
        engine.initialize().await?;
        let kind = SchemeKind::ExactInteger;
        let sk = engine.secret_key_handle(kind)?;

        let tasks = (1..=8)
            .map(|v| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.encrypt(kind, v as f64, None).await })
            })
            .collect::<Vec<_>>();
        let mut blobs = Vec::with_capacity(tasks.len());
        for task in tasks {
            blobs.push(task.await??);
        }

        let total = engine.sum(kind, blobs).await?;
        assert_eq!(engine.decrypt(kind, total, sk).await?, 36.0);
        Ok(())
    }

    #[tokio::test]
    async fn approximate_real_average() -> Result<(), Box<dyn StdError>> {
        let engine = AsyncEngine::new(config());
        engine.initialize().await?;
        let kind = SchemeKind::ApproximateReal;
        let sk = engine.secret_key_handle(kind)?;
        let pk = engine.export_public_key(kind).await?;

        let blobs = engine.encrypt_many(kind, vec![2.0, 4.0, 9.0], Some(pk)).await?;
        let average = engine.average(kind, blobs).await?;
        assert!((engine.decrypt(kind, average, sk).await? - 5.0).abs() < 1e-3);
        Ok(())
    }
}
