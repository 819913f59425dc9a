//! Interpretation of the witness exported after proving.
//!
//! The exported witness is a JSON array of decimal strings. Index 1 holds the circuit-computed root
//! and, for the uniqueness circuit, index 3 holds the uniqueness flag (`"0"` means a duplicate pair
//! was found).

use crate::constants::{WITNESS_ROOT_INDEX, WITNESS_ROOT_MATCHES_INDEX, WITNESS_UNIQUE_INDEX};
use crate::error::{Result, ZkError};
use crate::types::{CircuitKind, fr_from_decimal, fr_to_decimal};
use ark_bn254::Fr;
use ark_ff::{One, Zero};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parse a JSON array of field elements written as decimal strings (bare numbers are accepted).
pub fn parse_decimal_array(text: &str) -> Result<Vec<String>> {
    let values: Vec<Value> = serde_json::from_str(text)?;
    values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ZkError::InvalidDecimal(other.to_string())),
        })
        .collect()
}

/// Readable witness values.
#[derive(Clone, Debug)]
pub struct WitnessReadback {
    values: Vec<String>,
}

impl WitnessReadback {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self {
            values: parse_decimal_array(text)?,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn element(&self, index: usize) -> Result<Fr> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| ZkError::MissingInput(format!("witness index {index}")))?;
        fr_from_decimal(value)
    }

    pub fn circuit_root(&self) -> Result<Fr> {
        self.element(WITNESS_ROOT_INDEX)
    }

    pub fn root_matches(&self) -> Result<Fr> {
        self.element(WITNESS_ROOT_MATCHES_INDEX)
    }

    pub fn uniqueness_flag(&self) -> Result<Fr> {
        self.element(WITNESS_UNIQUE_INDEX)
    }
}

/// The two independent conclusions drawn from a run.
///
/// These are informational; the cryptographic check is the proof verification itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Circuit-computed root equals the independently computed root.
    pub authentic: bool,
    /// `None` when the circuit does not check uniqueness.
    pub unique: Option<bool>,
    /// Circuit's own `root_matches` output is exactly 1.
    pub root_matches: Option<bool>,
    pub circuit_root: String,
    pub expected_root: String,
}

/// Compare the witness against the commitment computed outside the circuit.
pub fn interpret(readback: &WitnessReadback, expected_root: &Fr, kind: CircuitKind) -> Result<Verdict> {
    let circuit_root = readback.circuit_root()?;

    let (unique, root_matches) = match kind {
        CircuitKind::Completeness => (None, None),
        CircuitKind::Uniqueness => (
            Some(!readback.uniqueness_flag()?.is_zero()),
            Some(readback.root_matches()?.is_one()),
        ),
    };

    Ok(Verdict {
        authentic: circuit_root == *expected_root,
        unique,
        root_matches,
        circuit_root: fr_to_decimal(&circuit_root),
        expected_root: fr_to_decimal(expected_root),
    })
}
