#![crate_name = "henum_math"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Ring arithmetic for the henum engine: modular arithmetic, the negacyclic
//! Number-Theoretic Transform, the residue number system, and polynomials in
//! R_q = Z_q\[x\] / (x^n + 1).

mod errors;
mod proto;

pub mod ntt;
pub mod rns;
pub mod rq;
pub mod util;
pub mod zq;

pub use errors::{Error, Result};

#[cfg(test)]
#[macro_use]
extern crate proptest;
