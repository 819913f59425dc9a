use crate::errors::PipelineError;
use crate::models::{Stage, StageRecord};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;
use zk_proofs::circuit::CircuitSpec;
use zk_proofs::readback::Verdict;
use zk_proofs::types::Commitment;

/// Everything a run has produced so far. Each field is filled by the stage that creates it.
#[derive(Debug)]
pub struct RunState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub commitment: Option<Commitment>,
    pub circuit: Option<CircuitSpec>,
    pub constraints: Option<u64>,
    pub ptau: Option<PathBuf>,
    pub verification_output: Option<String>,
    pub verdict: Option<Verdict>,
    pub stages: Vec<StageRecord>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            commitment: None,
            circuit: None,
            constraints: None,
            ptau: None,
            verification_output: None,
            verdict: None,
            stages: Vec::with_capacity(Stage::COUNT),
        }
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.stages.push(StageRecord {
            stage,
            index: stage.index(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
    }

    pub fn commitment(&self) -> Result<&Commitment, PipelineError> {
        self.commitment
            .as_ref()
            .ok_or(PipelineError::OutOfOrder { missing: "dataset commitment" })
    }

    pub fn circuit(&self) -> Result<&CircuitSpec, PipelineError> {
        self.circuit
            .as_ref()
            .ok_or(PipelineError::OutOfOrder { missing: "circuit" })
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
