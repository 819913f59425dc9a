//! Two-to-one field hash used for the Merkle tree.
//!
//! The tree hash must agree bit-for-bit with circomlib's `Poseidon(2)` template, because the
//! root computed here is compared against the root the circuit computes.

use crate::error::{Result, ZkError};
use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

/// A two-input hash over BN254 scalar field elements.
pub trait PairHasher {
    fn hash_pair(&mut self, left: &Fr, right: &Fr) -> Result<Fr>;
}

/// Poseidon with circomlib's parameters (width 3, 8 full rounds, 57 partial rounds).
pub struct CircomPoseidon {
    inner: Poseidon<Fr>,
}

impl CircomPoseidon {
    /// Build the round constants and MDS matrix.
    ///
    /// This is the one-time setup cost of the hasher; build once and inject it where needed.
    pub fn new() -> Result<Self> {
        let inner = Poseidon::<Fr>::new_circom(2).map_err(|e| ZkError::HashDomain(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl PairHasher for CircomPoseidon {
    fn hash_pair(&mut self, left: &Fr, right: &Fr) -> Result<Fr> {
        self.inner
            .hash(&[*left, *right])
            .map_err(|e| ZkError::HashDomain(e.to_string()))
    }
}
