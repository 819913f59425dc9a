//! Crate-wide constants shared by the circuit generator, the commitment builder and the
//! host-side orchestration.

/// circom language version emitted in the generated `pragma` line.
pub const CIRCOM_VERSION: &str = "2.1.9";

/// Include path for circomlib's Poseidon template.
///
/// Resolved by the compiler against its `-l` library directories, so the orchestrator passes the
/// circomlib checkout (or `node_modules`) root with `-l`.
pub const POSEIDON_INCLUDE: &str = "circomlib/circuits/poseidon.circom";

/// Number of inputs of every hasher in the Merkle tree.
pub const POSEIDON_ARITY: usize = 2;

/// Default file stem of the uniqueness circuit (full circuit: root, root check, pairwise checks).
pub const UNIQUE_CIRCUIT_NAME: &str = "zkp_unique_rows";

/// Default file stem of the completeness circuit (hash tree and root only).
pub const COMPLETE_CIRCUIT_NAME: &str = "zkp_complete_rows";

// Witness layout.
//
// circom places the constant `1` at index 0 followed by the main template's outputs in
// declaration order. The generator declares `root`, then `root_matches`, then `is_unique`.
pub const WITNESS_ROOT_INDEX: usize = 1;
pub const WITNESS_ROOT_MATCHES_INDEX: usize = 2;
pub const WITNESS_UNIQUE_INDEX: usize = 3;

/// Approximate number of R1CS constraints of one circomlib `Poseidon(2)` instance.
///
/// Only used for the pre-compile estimate; the authoritative count comes from the compiled r1cs.
pub const POSEIDON2_CONSTRAINTS: u64 = 240;

/// Conventional prefix of the Hermez powers-of-tau files.
pub const PTAU_PREFIX: &str = "powersOfTau28_hez_final";

/// File extension of powers-of-tau files.
pub const PTAU_EXTENSION: &str = "ptau";
