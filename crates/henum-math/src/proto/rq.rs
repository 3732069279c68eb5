#![allow(missing_docs)]

#[allow(clippy::derive_partial_eq_without_eq)]
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Rq {
    #[prost(enumeration = "Representation", tag = "1")]
    pub representation: i32,
    #[prost(uint32, tag = "2")]
    pub degree: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub coefficients: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Representation {
    Unknown = 0,
    Powerbasis = 1,
    Ntt = 2,
}
