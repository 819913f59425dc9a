use crate::errors::PipelineError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The three working directories of a run and the artifact paths inside them.
#[derive(Debug, Clone)]
pub struct WorkDirs {
    root: PathBuf,
    circuit_name: String,
}

impl WorkDirs {
    pub fn new(root: impl Into<PathBuf>, circuit_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            circuit_name: circuit_name.into(),
        }
    }

    /// circom build output.
    pub fn circuit_dir(&self) -> PathBuf {
        self.root.join("circom")
    }

    /// Proving artifacts.
    pub fn snarkjs_dir(&self) -> PathBuf {
        self.root.join("snarkjs")
    }

    /// Circuit source, proof input and run report.
    pub fn script_dir(&self) -> PathBuf {
        self.root.join("scripts")
    }

    fn all(&self) -> [PathBuf; 3] {
        [self.circuit_dir(), self.snarkjs_dir(), self.script_dir()]
    }

    /// Delete and recreate every working directory.
    pub fn recreate(&self) -> Result<(), PipelineError> {
        for dir in self.all() {
            if dir.exists() {
                debug!(dir = %dir.display(), "removing previous run output");
                fs::remove_dir_all(&dir)?;
            }
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn circuit_source(&self) -> PathBuf {
        self.script_dir().join(format!("{}.circom", self.circuit_name))
    }

    pub fn proof_input(&self) -> PathBuf {
        self.script_dir().join("input.json")
    }

    pub fn run_report(&self) -> PathBuf {
        self.script_dir().join("run_report.json")
    }

    pub fn r1cs(&self) -> PathBuf {
        self.circuit_dir().join(format!("{}.r1cs", self.circuit_name))
    }

    fn js_dir(&self) -> PathBuf {
        self.circuit_dir().join(format!("{}_js", self.circuit_name))
    }

    pub fn wasm(&self) -> PathBuf {
        self.js_dir().join(format!("{}.wasm", self.circuit_name))
    }

    pub fn witness_script(&self) -> PathBuf {
        self.js_dir().join("generate_witness.js")
    }

    pub fn witness(&self) -> PathBuf {
        self.snarkjs_dir().join("witness.wtns")
    }

    pub fn zkey(&self) -> PathBuf {
        self.snarkjs_dir().join(format!("{}.zkey", self.circuit_name))
    }

    pub fn verification_key(&self) -> PathBuf {
        self.snarkjs_dir().join("verification_key.json")
    }

    pub fn proof(&self) -> PathBuf {
        self.snarkjs_dir().join("proof.json")
    }

    pub fn public_signals(&self) -> PathBuf {
        self.snarkjs_dir().join("public.json")
    }

    pub fn witness_json(&self) -> PathBuf {
        self.snarkjs_dir().join("witness.json")
    }
}

/// Fail with `ArtifactMissing` unless `path` is an existing file.
pub fn require_artifact(path: &Path) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::ArtifactMissing {
            path: path.to_path_buf(),
        })
    }
}

pub fn read_artifact(path: &Path) -> Result<String, PipelineError> {
    require_artifact(path)?;
    Ok(fs::read_to_string(path)?)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
