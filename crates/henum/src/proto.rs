//! Protobuf messages of the wire format.
#![allow(missing_docs)]

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    #[prost(uint32, tag = "1")]
    pub version: u32,
    #[prost(enumeration = "ObjectKind", tag = "2")]
    pub kind: i32,
    #[prost(enumeration = "Scheme", tag = "3")]
    pub scheme: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub context_id: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub digest: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Ciphertext {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub c: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(uint32, tag = "2")]
    pub level: u32,
    #[prost(double, tag = "3")]
    pub scale: f64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Plaintext {
    #[prost(bytes = "vec", tag = "1")]
    pub poly: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub level: u32,
    #[prost(double, tag = "3")]
    pub scale: f64,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublicKey {
    #[prost(bytes = "vec", tag = "1")]
    pub pk0: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub pk1: ::prost::alloc::vec::Vec<u8>,
}
#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Parameters {
    #[prost(enumeration = "Scheme", tag = "1")]
    pub scheme: i32,
    #[prost(uint32, tag = "2")]
    pub degree: u32,
    #[prost(uint64, repeated, tag = "3")]
    pub moduli: ::prost::alloc::vec::Vec<u64>,
    #[prost(uint64, tag = "4")]
    pub plain_modulus: u64,
    #[prost(uint32, tag = "5")]
    pub scale_bits: u32,
    #[prost(uint32, tag = "6")]
    pub variance: u32,
    #[prost(enumeration = "SecurityLevel", tag = "7")]
    pub security: i32,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ObjectKind {
    Unknown = 0,
    Ciphertext = 1,
    Plaintext = 2,
    PublicKey = 3,
    Parameters = 4,
}
impl ObjectKind {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            ObjectKind::Unknown => "UNKNOWN",
            ObjectKind::Ciphertext => "CIPHERTEXT",
            ObjectKind::Plaintext => "PLAINTEXT",
            ObjectKind::PublicKey => "PUBLIC_KEY",
            ObjectKind::Parameters => "PARAMETERS",
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Scheme {
    Unknown = 0,
    ExactInteger = 1,
    ApproximateReal = 2,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SecurityLevel {
    Tc128 = 0,
    Tc192 = 1,
    Tc256 = 2,
}
