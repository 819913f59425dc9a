use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;
use zk_proofs::readback::Verdict;
use zk_proofs::types::{CircuitKind, TreeShape};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    CircuitGenerated,
    Compiled,
    WitnessGenerated,
    TrustedSetupDone,
    VerificationKeyExported,
    Proved,
    Verified,
    Interpreted,
}

impl Stage {
    pub const COUNT: usize = 9;

    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::Init,
        Stage::CircuitGenerated,
        Stage::Compiled,
        Stage::WitnessGenerated,
        Stage::TrustedSetupDone,
        Stage::VerificationKeyExported,
        Stage::Proved,
        Stage::Verified,
        Stage::Interpreted,
    ];

    /// 1-based position, as shown in progress logs.
    pub fn index(self) -> usize {
        self as usize + 1
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index()).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::CircuitGenerated => "circuit_generated",
            Stage::Compiled => "compiled",
            Stage::WitnessGenerated => "witness_generated",
            Stage::TrustedSetupDone => "trusted_setup_done",
            Stage::VerificationKeyExported => "verification_key_exported",
            Stage::Proved => "proved",
            Stage::Verified => "verified",
            Stage::Interpreted => "interpreted",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Init => "committing to the dataset",
            Stage::CircuitGenerated => "generating the circom file",
            Stage::Compiled => "compiling the circuit",
            Stage::WitnessGenerated => "generating the witness",
            Stage::TrustedSetupDone => "running the trusted setup",
            Stage::VerificationKeyExported => "exporting the verification key",
            Stage::Proved => "generating the proof",
            Stage::Verified => "verifying the proof",
            Stage::Interpreted => "interpreting the witness",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub index: usize,
    pub elapsed_ms: u64,
}

/// Summary of a successful run, persisted as `run_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub dataset: String,
    pub kind: CircuitKind,
    pub circuit_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub shape: TreeShape,
    pub estimated_constraints: u64,
    pub constraints: u64,
    pub ptau: PathBuf,
    pub verdict: Verdict,
    pub verification_output: String,
    pub stages: Vec<StageRecord>,
}

impl RunReport {
    pub fn total_elapsed_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.elapsed_ms).sum()
    }
}
