//! Types shared between the commitment builder, the circuit generator and the host-side
//! orchestration.

use crate::constants::{COMPLETE_CIRCUIT_NAME, UNIQUE_CIRCUIT_NAME};
use crate::error::{Result, ZkError};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One dataset record: its field values in column order.
///
/// Fields are expected to already be canonical strings; the row is hashed exactly as given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Delimiter-free concatenation of the fields, the preimage of the row digest.
    pub fn preimage(&self) -> String {
        self.0.concat()
    }
}

/// Which circuit the pipeline generates and proves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    /// Merkle root over the padded leaves.
    Completeness,
    /// Merkle root, root-equality flag and pairwise uniqueness accumulator.
    Uniqueness,
}

impl CircuitKind {
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Completeness => COMPLETE_CIRCUIT_NAME,
            Self::Uniqueness => UNIQUE_CIRCUIT_NAME,
        }
    }

    /// Whether the proof input carries `expectedRoot`.
    pub fn takes_expected_root(&self) -> bool {
        matches!(self, Self::Uniqueness)
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completeness => f.write_str("completeness"),
            Self::Uniqueness => f.write_str("uniqueness"),
        }
    }
}

/// Shape of the complete binary Merkle tree over a dataset.
///
/// Invariant: `num_leaves == 2^depth` and `num_leaves >= num_rows >= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeShape {
    num_rows: usize,
    depth: u32,
    num_leaves: usize,
}

impl TreeShape {
    /// Minimal shape for `num_rows` rows: `depth = ceil(log2(num_rows))`.
    pub fn for_rows(num_rows: usize) -> Result<Self> {
        if num_rows == 0 {
            return Err(ZkError::EmptyDataset);
        }
        let num_leaves = num_rows
            .checked_next_power_of_two()
            .ok_or(ZkError::InvalidShape { num_rows, num_leaves: 0 })?;
        Ok(Self {
            num_rows,
            depth: num_leaves.trailing_zeros(),
            num_leaves,
        })
    }

    /// Shape with an explicit depth. The depth may exceed the minimal one (extra zero padding),
    /// but must leave room for every row.
    pub fn new(num_rows: usize, depth: u32) -> Result<Self> {
        let num_leaves = 1usize.checked_shl(depth).unwrap_or(0);
        if num_rows < 1 || num_leaves == 0 || num_leaves < num_rows {
            return Err(ZkError::InvalidShape { num_rows, num_leaves });
        }
        Ok(Self {
            num_rows,
            depth,
            num_leaves,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn padding(&self) -> usize {
        self.num_leaves - self.num_rows
    }

    /// Number of unordered pairs among the real rows.
    pub fn num_pairs(&self) -> usize {
        self.num_rows * (self.num_rows - 1) / 2
    }
}

/// Result of committing to a dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    /// Padded leaf values; indices `>= shape.num_rows()` are zero padding.
    pub leaves: Vec<Fr>,
    pub shape: TreeShape,
    pub root: Fr,
}

impl Commitment {
    /// Leaves that come from dataset rows (padding excluded).
    pub fn row_leaves(&self) -> &[Fr] {
        &self.leaves[..self.shape.num_rows()]
    }

    /// Input record consumed by the witness generator.
    pub fn proof_input(&self, kind: CircuitKind) -> ProofInput {
        ProofInput {
            leaves: self.leaves.iter().map(fr_to_decimal).collect(),
            expected_root: kind.takes_expected_root().then(|| fr_to_decimal(&self.root)),
        }
    }
}

/// Persisted proof input (`input.json`): decimal-string field elements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInput {
    pub leaves: Vec<String>,
    #[serde(rename = "expectedRoot", default, skip_serializing_if = "Option::is_none")]
    pub expected_root: Option<String>,
}

impl ProofInput {
    /// Parse the leaves back into field elements, rejecting non-canonical values.
    pub fn leaf_elements(&self) -> Result<Vec<Fr>> {
        self.leaves.iter().map(|s| fr_from_decimal(s)).collect()
    }

    pub fn expected_root_element(&self) -> Result<Option<Fr>> {
        self.expected_root.as_deref().map(fr_from_decimal).transpose()
    }
}

/// BN254 scalar field modulus as a big integer.
pub fn field_modulus() -> BigUint {
    BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be())
}

/// Map an arbitrary unsigned integer into the field by reduction modulo `p`.
pub fn reduce_to_field(value: &BigUint) -> Fr {
    Fr::from_be_bytes_mod_order(&value.to_bytes_be())
}

pub fn fr_to_biguint(f: &Fr) -> BigUint {
    BigUint::from_bytes_be(&f.into_bigint().to_bytes_be())
}

/// Canonical decimal representation of a field element (`"0"` for zero).
pub fn fr_to_decimal(f: &Fr) -> String {
    fr_to_biguint(f).to_str_radix(10)
}

/// Parse a decimal string that must already be a canonical field element (`< p`).
pub fn fr_from_decimal(s: &str) -> Result<Fr> {
    let digits = s.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ZkError::InvalidDecimal(s.to_string()));
    }
    let value = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| ZkError::InvalidDecimal(s.to_string()))?;
    if value >= field_modulus() {
        return Err(ZkError::HashDomain(format!("{s} is not below the field modulus")));
    }
    Ok(reduce_to_field(&value))
}
