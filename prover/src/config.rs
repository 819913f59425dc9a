use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use zk_proofs::types::CircuitKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Commitment plus pairwise row-uniqueness check.
    Unique,
    /// Commitment only.
    Complete,
}

impl From<Mode> for CircuitKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Unique => CircuitKind::Uniqueness,
            Mode::Complete => CircuitKind::Completeness,
        }
    }
}

/// Commit to a CSV dataset and prove its Merkle root with circom and snarkjs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file with a header row.
    pub dataset: PathBuf,

    #[arg(long, value_enum, env = "ZKDS_MODE", default_value = "unique")]
    pub mode: Mode,

    /// Root of the generated working directories. Wiped at the start of each run.
    #[arg(long, env = "ZKDS_WORK_DIR", default_value = "generated")]
    pub work_dir: PathBuf,

    /// Directory holding the `*_<k>.ptau` parameter files.
    #[arg(long, env = "ZKDS_PTAU_DIR", default_value = "ptau")]
    pub ptau_dir: PathBuf,

    /// Include path for circomlib, passed to circom as `-l`.
    #[arg(long, env = "ZKDS_CIRCOMLIB")]
    pub circomlib: Option<PathBuf>,

    #[arg(long, env = "ZKDS_CIRCOM_BIN", default_value = "circom")]
    pub circom_bin: PathBuf,

    #[arg(long, env = "ZKDS_SNARKJS_BIN", default_value = "snarkjs")]
    pub snarkjs_bin: PathBuf,

    #[arg(long, env = "ZKDS_NODE_BIN", default_value = "node")]
    pub node_bin: PathBuf,

    /// Node heap limit in MiB for snarkjs and the witness generator.
    #[arg(long, env = "ZKDS_NODE_HEAP_MB")]
    pub node_heap_mb: Option<u32>,

    /// Circuit and template file name; defaults to one per mode.
    #[arg(long, env = "ZKDS_CIRCUIT_NAME")]
    pub circuit_name: Option<String>,
}

/// External tool locations.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub circom: PathBuf,
    pub snarkjs: PathBuf,
    pub node: PathBuf,
    pub node_heap_mb: Option<u32>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            circom: PathBuf::from("circom"),
            snarkjs: PathBuf::from("snarkjs"),
            node: PathBuf::from("node"),
            node_heap_mb: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub kind: CircuitKind,
    pub circuit_name: String,
    pub work_dir: PathBuf,
    pub ptau_dir: PathBuf,
    pub circomlib: Option<PathBuf>,
    pub tools: ToolPaths,
}

impl PipelineConfig {
    pub fn new(kind: CircuitKind, work_dir: PathBuf, ptau_dir: PathBuf) -> Self {
        Self {
            kind,
            circuit_name: kind.default_name().to_string(),
            work_dir,
            ptau_dir,
            circomlib: None,
            tools: ToolPaths::default(),
        }
    }
}

impl From<&Args> for PipelineConfig {
    fn from(args: &Args) -> Self {
        let kind = CircuitKind::from(args.mode);
        let mut config = PipelineConfig::new(kind, args.work_dir.clone(), args.ptau_dir.clone());
        if let Some(name) = &args.circuit_name {
            config.circuit_name = name.clone();
        }
        config.circomlib = args.circomlib.clone();
        config.tools = ToolPaths {
            circom: args.circom_bin.clone(),
            snarkjs: args.snarkjs_bin.clone(),
            node: args.node_bin.clone(),
            node_heap_mb: args.node_heap_mb,
        };
        config
    }
}
