//! ZK layer for dataset commitments.
//!
//! This crate contains:
//! - Row hashing and the Poseidon Merkle commitment to a dataset.
//! - A generator for the circom circuit proving completeness and row uniqueness.
//! - Selection of trusted-setup parameters by constraint count.
//! - Interpretation of the witness exported after proving.

pub mod circuit;
pub mod commitment;
pub mod constants;
pub mod error;
pub mod poseidon;
pub mod ptau;
pub mod readback;
pub mod types;

pub use error::{Result, ZkError};
