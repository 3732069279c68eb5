#![warn(missing_docs, unused_imports)]

//! Residue number system: integers modulo `q = q_0 * ... * q_{k-1}`
//! represented by their residues modulo each `q_i`.

use crate::{zq::Modulus, Error, Result};
use ndarray::ArrayView1;
use num_bigint::{BigInt, BigUint};
use num_traits::{cast::ToPrimitive, One, Zero};
use std::fmt::Debug;

/// Moduli of a residue number system with their reconstruction constants.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct RnsContext {
    moduli: Vec<Modulus>,
    // (q / q_i) * ((q / q_i)^-1 mod q_i)
    crt_basis: Vec<BigUint>,
    product: BigUint,
    half_product: BigUint,
}

impl Debug for RnsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RnsContext")
            .field("moduli", &self.moduli.iter().map(|qi| **qi).collect::<Vec<_>>())
            .finish()
    }
}

impl RnsContext {
    /// Builds the system, which requires a non-empty list of pairwise
    /// coprime moduli.
    pub fn new(moduli: &[u64]) -> Result<Self> {
        if moduli.is_empty() {
            return Err(Error::Default("The list of moduli is empty".to_string()));
        }
        let product = moduli
            .iter()
            .fold(BigUint::one(), |acc, qi| acc * *qi);

        let crt_basis = moduli
            .iter()
            .map(|qi| {
                let cofactor = &product / *qi;
                // Only invertible when q_i is coprime with the other moduli.
                (&cofactor % *qi)
                    .modinv(&BigUint::from(*qi))
                    .map(|inv| cofactor * inv)
                    .ok_or_else(|| Error::Default("The moduli are not coprime".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            moduli: moduli
                .iter()
                .map(|qi| Modulus::new(*qi))
                .collect::<Result<_>>()?,
            crt_basis,
            half_product: &product >> 1usize,
            product,
        })
    }

    /// The product `q` of the moduli.
    #[must_use]
    pub const fn modulus(&self) -> &BigUint {
        &self.product
    }

    /// The moduli.
    #[must_use]
    pub fn moduli(&self) -> &[Modulus] {
        &self.moduli
    }

    /// Residues of `a` modulo each `q_i`.
    #[must_use]
    pub fn project(&self, a: &BigUint) -> Vec<u64> {
        self.moduli
            .iter()
            .map(|qi| (a % **qi).to_u64().unwrap_or_default())
            .collect()
    }

    /// The integer in `[0, q)` with the given residues.
    #[must_use]
    pub fn lift(&self, residues: ArrayView1<u64>) -> BigUint {
        debug_assert_eq!(residues.len(), self.crt_basis.len());
        residues
            .iter()
            .zip(&self.crt_basis)
            .fold(BigUint::zero(), |acc, (r, b)| acc + b * *r)
            % &self.product
    }

    /// The integer in `(-q/2, q/2]` with the given residues.
    #[must_use]
    pub fn lift_centered(&self, residues: ArrayView1<u64>) -> BigInt {
        let x = BigInt::from(self.lift(residues));
        if x > BigInt::from(self.half_product.clone()) {
            x - BigInt::from(self.product.clone())
        } else {
            x
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::RnsContext;
    use ndarray::ArrayView1;
    use num_bigint::{BigInt, BigUint};
    use rand::RngCore;

    #[test]
    fn constructor() {
        assert!(RnsContext::new(&[2]).is_ok());
        assert!(RnsContext::new(&[4, 15, 1153]).is_ok());

        let e = RnsContext::new(&[]);
        assert_eq!(e.unwrap_err().to_string(), "The list of moduli is empty");
        for moduli in [&[2u64, 4][..], &[3, 5, 7, 30][..]] {
            let e = RnsContext::new(moduli);
            assert_eq!(e.unwrap_err().to_string(), "The moduli are not coprime");
        }
    }

    #[test]
    fn residues() -> Result<(), Box<dyn Error>> {
        let rns = RnsContext::new(&[4, 15, 1153])?;
        let q = 4u64 * 15 * 1153;
        assert_eq!(rns.modulus(), &BigUint::from(q));

        let r = rns.project(&BigUint::from(15u64));
        assert_eq!(r, [3, 0, 15]);
        assert_eq!(rns.lift(ArrayView1::from(&r)), BigUint::from(15u64));

        let r = rns.project(&BigUint::from(q - 1));
        assert_eq!(r, [3, 14, 1152]);
        assert_eq!(rns.lift_centered(ArrayView1::from(&r)), BigInt::from(-1));

        let mut rng = rand::rng();
        for _ in 0..100 {
            let a = BigUint::from(rng.next_u64() % q);
            assert_eq!(rns.lift(ArrayView1::from(&rns.project(&a))), a);
        }
        Ok(())
    }
}
