//! External circom / snarkjs invocations.

use crate::config::ToolPaths;
use crate::errors::{ExitInfo, PipelineError};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Circom,
    Node,
    Snarkjs,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tool::Circom => "circom",
            Tool::Node => "node",
            Tool::Snarkjs => "snarkjs",
        })
    }
}

/// One external command, with the artifact paths it reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation<'a> {
    Compile {
        circuit: &'a Path,
        out_dir: &'a Path,
        circomlib: Option<&'a Path>,
    },
    GenerateWitness {
        script: &'a Path,
        wasm: &'a Path,
        input: &'a Path,
        witness: &'a Path,
    },
    ConstraintInfo {
        r1cs: &'a Path,
    },
    Setup {
        r1cs: &'a Path,
        ptau: &'a Path,
        zkey: &'a Path,
    },
    ExportVerificationKey {
        zkey: &'a Path,
        vkey: &'a Path,
    },
    Prove {
        zkey: &'a Path,
        witness: &'a Path,
        proof: &'a Path,
        public: &'a Path,
    },
    Verify {
        vkey: &'a Path,
        public: &'a Path,
        proof: &'a Path,
    },
    ExportWitness {
        witness: &'a Path,
        json: &'a Path,
    },
}

impl Invocation<'_> {
    pub fn tool(&self) -> Tool {
        match self {
            Invocation::Compile { .. } => Tool::Circom,
            Invocation::GenerateWitness { .. } => Tool::Node,
            _ => Tool::Snarkjs,
        }
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Invocation::Compile { .. } => "compile",
            Invocation::GenerateWitness { .. } => "generate witness",
            Invocation::ConstraintInfo { .. } => "r1cs info",
            Invocation::Setup { .. } => "groth16 setup",
            Invocation::ExportVerificationKey { .. } => "export verification key",
            Invocation::Prove { .. } => "groth16 prove",
            Invocation::Verify { .. } => "groth16 verify",
            Invocation::ExportWitness { .. } => "export witness",
        }
    }

    pub fn args(&self) -> Vec<OsString> {
        fn os(part: impl AsRef<OsStr>) -> OsString {
            part.as_ref().to_os_string()
        }

        match *self {
            Invocation::Compile {
                circuit,
                out_dir,
                circomlib,
            } => {
                let mut args = vec![
                    os(circuit),
                    os("--r1cs"),
                    os("--wasm"),
                    os("--sym"),
                    os("--c"),
                    os("--output"),
                    os(out_dir),
                ];
                if let Some(lib) = circomlib {
                    args.extend([os("-l"), os(lib)]);
                }
                args
            }
            Invocation::GenerateWitness {
                script,
                wasm,
                input,
                witness,
            } => vec![os(script), os(wasm), os(input), os(witness)],
            Invocation::ConstraintInfo { r1cs } => vec![os("r1cs"), os("info"), os(r1cs)],
            Invocation::Setup { r1cs, ptau, zkey } => {
                vec![os("groth16"), os("setup"), os(r1cs), os(ptau), os(zkey)]
            }
            Invocation::ExportVerificationKey { zkey, vkey } => {
                vec![os("zkey"), os("export"), os("verificationkey"), os(zkey), os(vkey)]
            }
            Invocation::Prove {
                zkey,
                witness,
                proof,
                public,
            } => vec![os("groth16"), os("prove"), os(zkey), os(witness), os(proof), os(public)],
            Invocation::Verify { vkey, public, proof } => {
                vec![os("groth16"), os("verify"), os(vkey), os(public), os(proof)]
            }
            Invocation::ExportWitness { witness, json } => {
                vec![os("wtns"), os("export"), os("json"), os(witness), os(json)]
            }
        }
    }
}

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
}

pub trait Toolchain {
    async fn run(&self, invocation: Invocation<'_>) -> Result<ToolOutput, PipelineError>;
}

/// Runs the real binaries as child processes.
#[derive(Debug, Clone)]
pub struct CliToolchain {
    paths: ToolPaths,
}

impl CliToolchain {
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    fn program(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Circom => &self.paths.circom,
            Tool::Node => &self.paths.node,
            Tool::Snarkjs => &self.paths.snarkjs,
        }
    }
}

impl Toolchain for CliToolchain {
    async fn run(&self, invocation: Invocation<'_>) -> Result<ToolOutput, PipelineError> {
        let tool = invocation.tool();
        let args = invocation.args();
        let program = self.program(tool);
        debug!(%tool, step = invocation.label(), program = %program.display(), ?args, "running external tool");

        let mut command = Command::new(program);
        command.args(&args).kill_on_drop(true);
        if let (Tool::Node | Tool::Snarkjs, Some(mb)) = (tool, self.paths.node_heap_mb) {
            command.env("NODE_OPTIONS", format!("--max-old-space-size={mb}"));
        }

        let output = command
            .output()
            .await
            .map_err(|source| PipelineError::ToolUnavailable {
                tool: tool.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        // Tools that report problems only on stderr still count as failed.
        if !output.status.success() || !stderr.is_empty() {
            return Err(PipelineError::ExternalToolFailure {
                tool: tool.to_string(),
                exit: ExitInfo {
                    code: output.status.code(),
                    stderr,
                },
            });
        }

        Ok(ToolOutput { stdout })
    }
}

/// Extract `N` from the `# of Constraints: N` line of `snarkjs r1cs info`.
pub fn parse_constraint_count(info: &str) -> Option<u64> {
    info.lines().find_map(|line| {
        let (_, rest) = line.split_once("# of Constraints:")?;
        rest.trim().parse().ok()
    })
}

/// `snarkjs groth16 verify` prints `OK!` on success.
pub fn verification_accepted(output: &str) -> bool {
    output.contains("OK!")
}
