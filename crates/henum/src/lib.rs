#![crate_name = "henum"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]
#![doc = include_str!("../README.md")]

mod ciphertext;
mod context;
mod errors;
mod keys;
mod parameters;
mod plaintext;
mod proto;
mod scheme;

pub mod benchmark;
pub mod codec;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod runtime;
pub mod serialize;
pub mod traits;

pub use ciphertext::Ciphertext;
pub use config::{EngineConfig, SchemeConfig};
pub use context::Context;
pub use engine::EngineHandle;
pub use errors::{Error, ParametersError, Result, SerializationError};
pub use keys::{
    with_ephemeral_keys, EphemeralKeys, KeyPair, PublicKey, SecretKey, SecretKeyHandle,
};
pub use parameters::{
    Parameters, ParametersBuilder, DEFAULT_DEGREE, DEFAULT_PLAIN_MODULUS_BITS, DEFAULT_SCALE_BITS,
    DEFAULT_VARIANCE,
};
pub use plaintext::Plaintext;
pub use scheme::{SchemeKind, SecurityLevel};
pub use serialize::WireObject;
