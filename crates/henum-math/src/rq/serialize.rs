//! Implementation of serialization and deserialization.

use std::sync::Arc;

use super::{traits::TryConvertFrom, Context, Poly, Representation};
use crate::{
    proto::rq::{Representation as RepresentationProto, Rq},
    Error, Result,
};
use prost::Message;

impl Poly {
    /// Serialize the polynomial into bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        Rq::from(self).encode_to_vec()
    }

    /// Deserialize a polynomial from bytes in the given context.
    ///
    /// Returns an error if the bytes do not describe a polynomial of this
    /// context, including when a coefficient is not reduced.
    pub fn from_bytes(bytes: &[u8], ctx: &Arc<Context>) -> Result<Self> {
        let rq: Rq = Message::decode(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        let representation = match RepresentationProto::try_from(rq.representation) {
            Ok(RepresentationProto::Ntt) => Representation::Ntt,
            Ok(RepresentationProto::Powerbasis) => Representation::PowerBasis,
            _ => return Err(Error::Serialization("Unknown representation".to_string())),
        };
        Poly::try_convert_from(&rq, ctx, representation)
    }
}
