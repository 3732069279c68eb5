//! Wire format of the objects that cross a network boundary.
//!
//! Every object is wrapped in an [`Envelope`] carrying the version, the kind
//! of object, the scheme, the fingerprint of the producing context, and the
//! SHA-256 digest of the payload. The envelope is length-delimited, and blobs
//! are its base64 encoding with the standard alphabet.

use crate::context::to_hex;
use crate::proto::{
    Ciphertext as CiphertextProto, Envelope, ObjectKind as ObjectKindProto,
    Plaintext as PlaintextProto, PublicKey as PublicKeyProto, Scheme as SchemeProto,
};
use crate::{
    Ciphertext, Context, Error, KeyPair, Parameters, Plaintext, PublicKey, Result, SchemeKind,
    SerializationError,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use henum_math::rq::{Context as RqContext, Poly, Representation};
use prost::{encoding::decode_varint, Message};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Version of the envelope produced by this crate.
pub const WIRE_VERSION: u32 = 1;

/// Kinds of objects that can be serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A [`Ciphertext`].
    Ciphertext,
    /// A [`Plaintext`].
    Plaintext,
    /// A [`PublicKey`].
    PublicKey,
    /// A set of [`Parameters`].
    Parameters,
}

impl ObjectKind {
    const fn to_proto(self) -> ObjectKindProto {
        match self {
            ObjectKind::Ciphertext => ObjectKindProto::Ciphertext,
            ObjectKind::Plaintext => ObjectKindProto::Plaintext,
            ObjectKind::PublicKey => ObjectKindProto::PublicKey,
            ObjectKind::Parameters => ObjectKindProto::Parameters,
        }
    }
}

/// Objects with a canonical wire encoding bound to a context.
///
/// Implementors only describe their payload; framing, digests, and the
/// context checks are shared.
pub trait WireObject
where
    Self: Sized,
{
    /// Kind written in the envelope.
    const KIND: ObjectKind;

    /// Scheme of the object.
    fn scheme(&self) -> SchemeKind;

    /// Fingerprint of the context of the object.
    fn context_id(&self) -> [u8; 32];

    /// Encoding of the object, without the envelope.
    fn payload(&self) -> Vec<u8>;

    /// Decode and validate a payload in a context.
    fn from_payload(ctx: &Arc<Context>, payload: &[u8]) -> Result<Self>;

    /// Length-delimited envelope holding the object.
    fn to_bytes(&self) -> Vec<u8> {
        seal(Self::KIND, self.scheme(), &self.context_id(), self.payload())
    }

    /// Base64 encoding of [`WireObject::to_bytes`].
    fn to_blob(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode an envelope produced under `ctx`.
    ///
    /// Returns [`Error::ContextMismatch`] if the envelope was produced under
    /// another scheme or context.
    fn from_bytes(ctx: &Arc<Context>, bytes: &[u8]) -> Result<Self> {
        let envelope = open(bytes, Self::KIND)?;
        if envelope.scheme != ctx.kind() || envelope.context_id != ctx.fingerprint() {
            return Err(Error::ContextMismatch {
                expected: ctx.fingerprint_hex(),
                found: to_hex(&envelope.context_id),
            });
        }
        Self::from_payload(ctx, &envelope.payload)
    }

    /// Decode a base64 blob produced under `ctx`.
    fn from_blob(ctx: &Arc<Context>, blob: &str) -> Result<Self> {
        Self::from_bytes(ctx, &decode_blob(blob)?)
    }
}

/// Envelope after the framing, version, kind, digest, and scheme checks.
struct OpenedEnvelope {
    scheme: SchemeKind,
    context_id: Vec<u8>,
    payload: Vec<u8>,
}

fn seal(kind: ObjectKind, scheme: SchemeKind, context_id: &[u8], payload: Vec<u8>) -> Vec<u8> {
    Envelope {
        version: WIRE_VERSION,
        kind: kind.to_proto() as i32,
        scheme: SchemeProto::from(scheme) as i32,
        context_id: context_id.to_vec(),
        digest: Sha256::digest(&payload).to_vec(),
        payload,
    }
    .encode_length_delimited_to_vec()
}

fn decode_blob(blob: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(blob)
        .map_err(|e| SerializationError::InvalidBase64(e.to_string()).into())
}

fn open(bytes: &[u8], expected: ObjectKind) -> Result<OpenedEnvelope> {
    let mut buf = bytes;
    let len = decode_varint(&mut buf)
        .map_err(|e| SerializationError::Protobuf(e.to_string()))? as usize;
    if len > buf.len() {
        return Err(SerializationError::Truncated {
            expected: len,
            found: buf.len(),
        }
        .into());
    }
    if len < buf.len() {
        return Err(SerializationError::TrailingBytes(buf.len() - len).into());
    }

    let envelope =
        Envelope::decode(buf).map_err(|e| SerializationError::Protobuf(e.to_string()))?;
    if envelope.version != WIRE_VERSION {
        return Err(SerializationError::UnsupportedVersion(envelope.version).into());
    }

    let kind = match ObjectKindProto::try_from(envelope.kind) {
        Ok(ObjectKindProto::Unknown) | Err(_) => {
            return Err(SerializationError::UnknownObjectKind(envelope.kind).into())
        }
        Ok(kind) => kind,
    };
    if kind != expected.to_proto() {
        return Err(SerializationError::UnexpectedObjectKind {
            expected: expected.to_proto().as_str_name(),
            found: kind.as_str_name(),
        }
        .into());
    }

    if Sha256::digest(&envelope.payload).as_slice() != envelope.digest.as_slice() {
        return Err(SerializationError::DigestMismatch.into());
    }

    let scheme = match SchemeProto::try_from(envelope.scheme) {
        Ok(SchemeProto::ExactInteger) => SchemeKind::ExactInteger,
        Ok(SchemeProto::ApproximateReal) => SchemeKind::ApproximateReal,
        _ => return Err(SerializationError::UnknownScheme(envelope.scheme).into()),
    };

    Ok(OpenedEnvelope {
        scheme,
        context_id: envelope.context_id,
        payload: envelope.payload,
    })
}

fn malformed(reason: impl ToString) -> Error {
    SerializationError::MalformedPayload(reason.to_string()).into()
}

fn protobuf(e: prost::DecodeError) -> Error {
    SerializationError::Protobuf(e.to_string()).into()
}

fn poly_from_bytes(
    bytes: &[u8],
    ctx: &Arc<RqContext>,
    representation: Representation,
) -> Result<Poly> {
    let poly = Poly::from_bytes(bytes, ctx).map_err(malformed)?;
    if poly.representation() != &representation {
        return Err(malformed(format!(
            "Expected a polynomial in {representation:?} representation"
        )));
    }
    Ok(poly)
}

fn level_context(ctx: &Context, level: u32) -> Result<&Arc<RqContext>> {
    ctx.ctx_at_level(level as usize).ok_or_else(|| {
        malformed(format!(
            "Level {level} is beyond the maximum level {}",
            ctx.max_level()
        ))
    })
}

fn check_scale(ctx: &Context, scale: f64) -> Result<()> {
    let valid = match ctx.kind() {
        SchemeKind::ExactInteger => scale == 1.0,
        SchemeKind::ApproximateReal => scale.is_finite() && scale > 0.0,
    };
    if valid {
        Ok(())
    } else {
        Err(malformed(format!("Invalid scale {scale}")))
    }
}

impl WireObject for Ciphertext {
    const KIND: ObjectKind = ObjectKind::Ciphertext;

    fn scheme(&self) -> SchemeKind {
        self.kind()
    }

    fn context_id(&self) -> [u8; 32] {
        *self.ctx.fingerprint()
    }

    fn payload(&self) -> Vec<u8> {
        CiphertextProto {
            c: self.c.iter().map(Poly::to_bytes).collect(),
            level: self.level as u32,
            scale: self.scale,
        }
        .encode_to_vec()
    }

    fn from_payload(ctx: &Arc<Context>, payload: &[u8]) -> Result<Self> {
        let proto = CiphertextProto::decode(payload).map_err(protobuf)?;
        if proto.c.len() != 2 {
            return Err(malformed(format!(
                "Expected 2 polynomials, found {}",
                proto.c.len()
            )));
        }
        let rq = level_context(ctx, proto.level)?;
        check_scale(ctx, proto.scale)?;
        let c = proto
            .c
            .iter()
            .map(|bytes| poly_from_bytes(bytes, rq, Representation::Ntt))
            .collect::<Result<Vec<_>>>()?;

        Ok(Ciphertext {
            ctx: ctx.clone(),
            c,
            level: proto.level as usize,
            scale: proto.scale,
        })
    }
}

impl WireObject for Plaintext {
    const KIND: ObjectKind = ObjectKind::Plaintext;

    fn scheme(&self) -> SchemeKind {
        self.kind()
    }

    fn context_id(&self) -> [u8; 32] {
        *self.ctx.fingerprint()
    }

    fn payload(&self) -> Vec<u8> {
        PlaintextProto {
            poly: self.poly.to_bytes(),
            level: self.level as u32,
            scale: self.scale,
        }
        .encode_to_vec()
    }

    fn from_payload(ctx: &Arc<Context>, payload: &[u8]) -> Result<Self> {
        let proto = PlaintextProto::decode(payload).map_err(protobuf)?;
        let rq = level_context(ctx, proto.level)?;
        check_scale(ctx, proto.scale)?;
        let poly = poly_from_bytes(&proto.poly, rq, Representation::PowerBasis)?;

        Ok(Plaintext {
            ctx: ctx.clone(),
            poly,
            level: proto.level as usize,
            scale: proto.scale,
        })
    }
}

impl WireObject for PublicKey {
    const KIND: ObjectKind = ObjectKind::PublicKey;

    fn scheme(&self) -> SchemeKind {
        self.ctx.kind()
    }

    fn context_id(&self) -> [u8; 32] {
        *self.ctx.fingerprint()
    }

    fn payload(&self) -> Vec<u8> {
        PublicKeyProto {
            pk0: self.pk0.to_bytes(),
            pk1: self.pk1.to_bytes(),
        }
        .encode_to_vec()
    }

    fn from_payload(ctx: &Arc<Context>, payload: &[u8]) -> Result<Self> {
        let proto = PublicKeyProto::decode(payload).map_err(protobuf)?;
        let rq = level_context(ctx, 0)?;
        Ok(PublicKey {
            ctx: ctx.clone(),
            pk0: poly_from_bytes(&proto.pk0, rq, Representation::Ntt)?,
            pk1: poly_from_bytes(&proto.pk1, rq, Representation::Ntt)?,
        })
    }
}

impl WireObject for Parameters {
    const KIND: ObjectKind = ObjectKind::Parameters;

    fn scheme(&self) -> SchemeKind {
        self.kind()
    }

    fn context_id(&self) -> [u8; 32] {
        self.fingerprint()
    }

    fn payload(&self) -> Vec<u8> {
        self.to_bytes()
    }

    fn from_payload(ctx: &Arc<Context>, payload: &[u8]) -> Result<Self> {
        let par = Parameters::try_from_bytes(payload)?;
        if &par.fingerprint() != ctx.fingerprint() {
            return Err(Error::ContextMismatch {
                expected: ctx.fingerprint_hex(),
                found: to_hex(&par.fingerprint()),
            });
        }
        Ok(par)
    }
}

impl Parameters {
    /// Decode parameters from a blob without a context, for instance to build
    /// the context a peer is using.
    pub fn from_blob(blob: &str) -> Result<Self> {
        let envelope = open(&decode_blob(blob)?, ObjectKind::Parameters)?;
        let par = Parameters::try_from_bytes(&envelope.payload)?;
        if par.kind() != envelope.scheme || par.fingerprint().as_slice() != envelope.context_id {
            return Err(malformed(
                "The envelope does not match the encoded parameters",
            ));
        }
        Ok(par)
    }
}

/// Export the public key of a key pair as a blob.
#[must_use]
pub fn export_public_key(keys: &KeyPair) -> String {
    keys.public_key().to_blob()
}

/// Import a public key produced under `ctx`.
pub fn import_public_key(ctx: &Arc<Context>, blob: &str) -> Result<PublicKey> {
    PublicKey::from_blob(ctx, blob)
}
