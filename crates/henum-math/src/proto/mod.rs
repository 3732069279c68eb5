//! Protobuf messages for the ring elements.

pub mod rq;
