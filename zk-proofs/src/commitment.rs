//! Row canonicalization and Merkle commitment to a dataset.
//!
//! Leaf derivation:
//! 1) SHA-256 over the delimiter-free concatenation of the row's fields.
//! 2) The 256-bit digest, read big-endian, is reduced modulo the BN254 scalar modulus.
//!
//! The reduced value is what the circuit receives as input, so the root computed here is the
//! root the circuit recomputes.

use crate::error::{Result, ZkError};
use crate::poseidon::PairHasher;
use crate::types::{Commitment, Row, TreeShape, fr_to_decimal, reduce_to_field};
use ark_bn254::Fr;
use ark_ff::Zero;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 digest of a row's preimage.
pub fn row_digest(row: &Row) -> [u8; 32] {
    Sha256::digest(row.preimage().as_bytes()).into()
}

/// Field element committed for a row.
pub fn row_leaf(row: &Row) -> Fr {
    reduce_to_field(&BigUint::from_bytes_be(&row_digest(row)))
}

/// Builds dataset commitments with an injected tree hasher.
pub struct CommitmentBuilder<H> {
    hasher: H,
}

impl<H: PairHasher> CommitmentBuilder<H> {
    pub fn new(hasher: H) -> Self {
        Self { hasher }
    }

    pub fn hasher_mut(&mut self) -> &mut H {
        &mut self.hasher
    }

    /// Hash every row, pad to a power of two with zero leaves and compute the root.
    pub fn commit(&mut self, rows: &[Row]) -> Result<Commitment> {
        let shape = TreeShape::for_rows(rows.len())?;

        let mut leaves = Vec::with_capacity(shape.num_leaves());
        for (index, row) in rows.iter().enumerate() {
            let digest = row_digest(row);
            let leaf = reduce_to_field(&BigUint::from_bytes_be(&digest));
            debug!(index, digest = %hex::encode(digest), leaf = %fr_to_decimal(&leaf), "hashed row");
            leaves.push(leaf);
        }
        leaves.resize(shape.num_leaves(), Fr::zero());

        let root = self.merkle_root(&leaves)?;
        debug!(
            num_rows = shape.num_rows(),
            depth = shape.depth(),
            num_leaves = shape.num_leaves(),
            root = %fr_to_decimal(&root),
            "computed dataset commitment"
        );

        Ok(Commitment { leaves, shape, root })
    }

    /// Reduce a level pairwise until one node remains.
    ///
    /// An odd level pairs its last node with zero. With power-of-two input this never happens.
    pub fn merkle_root(&mut self, leaves: &[Fr]) -> Result<Fr> {
        if leaves.is_empty() {
            return Err(ZkError::EmptyDataset);
        }

        let mut level = leaves.to_vec();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or_else(Fr::zero);
                    self.hasher.hash_pair(&pair[0], &right)
                })
                .collect::<Result<Vec<_>>>()?;
        }

        Ok(level[0])
    }
}
