//! Stage machine driving one proving run from dataset to verdict.

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::errors::{PipelineError, StageFailure};
use crate::models::{RunReport, Stage};
use crate::state::RunState;
use crate::toolchain::{Invocation, Toolchain, parse_constraint_count, verification_accepted};
use crate::workdir::{WorkDirs, read_artifact, require_artifact, write_json};
use chrono::Utc;
use std::fs;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use zk_proofs::circuit::CircuitSpec;
use zk_proofs::commitment::CommitmentBuilder;
use zk_proofs::poseidon::PairHasher;
use zk_proofs::ptau::select_parameter_file;
use zk_proofs::readback::{WitnessReadback, interpret, parse_decimal_array};
use zk_proofs::types::{Row, fr_to_decimal};

pub struct Pipeline<T, H> {
    config: PipelineConfig,
    dirs: WorkDirs,
    toolchain: T,
    builder: CommitmentBuilder<H>,
}

impl<T: Toolchain, H: PairHasher> Pipeline<T, H> {
    pub fn new(config: PipelineConfig, toolchain: T, hasher: H) -> Self {
        let dirs = WorkDirs::new(&config.work_dir, &config.circuit_name);
        Self {
            config,
            dirs,
            toolchain,
            builder: CommitmentBuilder::new(hasher),
        }
    }

    pub fn dirs(&self) -> &WorkDirs {
        &self.dirs
    }

    #[cfg(test)]
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Run every stage from `Init`. The first failure aborts the run and leaves its output on disk.
    pub async fn run(&mut self, dataset: &Dataset) -> Result<RunReport, StageFailure> {
        let state = RunState::new();
        let span = info_span!("run", run_id = %state.run_id, dataset = %dataset.name);
        self.run_stages(dataset, state).instrument(span).await
    }

    async fn run_stages(&mut self, dataset: &Dataset, mut state: RunState) -> Result<RunReport, StageFailure> {
        info!(kind = %self.config.kind, rows = dataset.rows.len(), "starting proof run");

        let mut next = Some(Stage::Init);
        while let Some(stage) = next {
            info!(
                step = %format!("{}/{}", stage.index(), Stage::COUNT),
                %stage,
                "{}",
                stage.description()
            );
            let started = Instant::now();
            self.execute(stage, &dataset.rows, &mut state)
                .await
                .map_err(|cause| StageFailure { stage, cause })?;
            let elapsed = started.elapsed();
            debug!(%stage, elapsed_ms = elapsed.as_millis() as u64, "stage finished");
            state.record(stage, elapsed);
            next = stage.next();
        }

        let report = self.report(dataset, state).map_err(|cause| StageFailure {
            stage: Stage::Interpreted,
            cause,
        })?;
        info!(
            total_ms = report.total_elapsed_ms(),
            report = %self.dirs.run_report().display(),
            "proof run finished"
        );
        Ok(report)
    }

    async fn execute(&mut self, stage: Stage, rows: &[Row], state: &mut RunState) -> Result<(), PipelineError> {
        match stage {
            Stage::Init => self.init(rows, state),
            Stage::CircuitGenerated => self.generate_circuit(state),
            Stage::Compiled => self.compile().await,
            Stage::WitnessGenerated => self.generate_witness().await,
            Stage::TrustedSetupDone => self.trusted_setup(state).await,
            Stage::VerificationKeyExported => self.export_verification_key().await,
            Stage::Proved => self.prove().await,
            Stage::Verified => self.verify(state).await,
            Stage::Interpreted => self.interpret(state).await,
        }
    }

    fn init(&mut self, rows: &[Row], state: &mut RunState) -> Result<(), PipelineError> {
        self.dirs.recreate()?;

        let commitment = self.builder.commit(rows)?;
        info!(
            rows = commitment.shape.num_rows(),
            depth = commitment.shape.depth(),
            leaves = commitment.shape.num_leaves(),
            root = %fr_to_decimal(&commitment.root),
            "dataset committed"
        );

        let input_path = self.dirs.proof_input();
        write_json(&input_path, &commitment.proof_input(self.config.kind))?;
        match fs::read_to_string(&input_path) {
            Ok(text) => debug!(path = %input_path.display(), input = %text, "proof input written"),
            Err(e) => warn!(path = %input_path.display(), error = %e, "could not echo proof input"),
        }

        state.commitment = Some(commitment);
        Ok(())
    }

    fn generate_circuit(&mut self, state: &mut RunState) -> Result<(), PipelineError> {
        let shape = state.commitment()?.shape;
        let circuit = CircuitSpec::for_shape(self.config.kind, shape);

        let path = self.dirs.circuit_source();
        fs::write(&path, circuit.render())?;
        info!(
            path = %path.display(),
            template = %circuit.template_name(),
            hashers = circuit.num_hashers(),
            pair_checks = circuit.num_pair_checks(),
            estimated_constraints = circuit.estimated_constraints(),
            "circuit written"
        );

        state.circuit = Some(circuit);
        Ok(())
    }

    async fn compile(&self) -> Result<(), PipelineError> {
        let circuit = self.dirs.circuit_source();
        let out_dir = self.dirs.circuit_dir();
        require_artifact(&circuit)?;

        self.toolchain
            .run(Invocation::Compile {
                circuit: &circuit,
                out_dir: &out_dir,
                circomlib: self.config.circomlib.as_deref(),
            })
            .await?;

        for artifact in [self.dirs.r1cs(), self.dirs.wasm(), self.dirs.witness_script()] {
            require_artifact(&artifact)?;
        }
        info!(out_dir = %out_dir.display(), "circuit compiled");
        Ok(())
    }

    async fn generate_witness(&self) -> Result<(), PipelineError> {
        let script = self.dirs.witness_script();
        let wasm = self.dirs.wasm();
        let input = self.dirs.proof_input();
        let witness = self.dirs.witness();
        for artifact in [&script, &wasm, &input] {
            require_artifact(artifact)?;
        }

        self.toolchain
            .run(Invocation::GenerateWitness {
                script: &script,
                wasm: &wasm,
                input: &input,
                witness: &witness,
            })
            .await?;

        require_artifact(&witness)?;
        info!(witness = %witness.display(), "witness generated");
        Ok(())
    }

    async fn trusted_setup(&self, state: &mut RunState) -> Result<(), PipelineError> {
        let r1cs = self.dirs.r1cs();
        let zkey = self.dirs.zkey();
        require_artifact(&r1cs)?;

        let info = self.toolchain.run(Invocation::ConstraintInfo { r1cs: &r1cs }).await?;
        let constraints = parse_constraint_count(&info.stdout).ok_or_else(|| PipelineError::MalformedArtifact {
            path: r1cs.clone(),
            reason: "r1cs info did not report a constraint count".to_string(),
        })?;

        let ptau = select_parameter_file(&self.config.ptau_dir, constraints)?;
        info!(
            constraints,
            estimated = state.circuit()?.estimated_constraints(),
            ptau = %ptau.display(),
            "selected smallest sufficient powers-of-tau file"
        );

        self.toolchain
            .run(Invocation::Setup {
                r1cs: &r1cs,
                ptau: &ptau,
                zkey: &zkey,
            })
            .await?;
        require_artifact(&zkey)?;

        state.constraints = Some(constraints);
        state.ptau = Some(ptau);
        Ok(())
    }

    async fn export_verification_key(&self) -> Result<(), PipelineError> {
        let zkey = self.dirs.zkey();
        let vkey = self.dirs.verification_key();
        require_artifact(&zkey)?;

        self.toolchain
            .run(Invocation::ExportVerificationKey { zkey: &zkey, vkey: &vkey })
            .await?;

        require_artifact(&vkey)?;
        info!(vkey = %vkey.display(), "verification key exported");
        Ok(())
    }

    async fn prove(&self) -> Result<(), PipelineError> {
        let zkey = self.dirs.zkey();
        let witness = self.dirs.witness();
        let proof = self.dirs.proof();
        let public = self.dirs.public_signals();
        require_artifact(&zkey)?;
        require_artifact(&witness)?;

        self.toolchain
            .run(Invocation::Prove {
                zkey: &zkey,
                witness: &witness,
                proof: &proof,
                public: &public,
            })
            .await?;

        require_artifact(&proof)?;
        require_artifact(&public)?;
        info!(proof = %proof.display(), "proof generated");

        match fs::read_to_string(&public).map_err(PipelineError::from).and_then(|text| {
            parse_decimal_array(&text).map_err(PipelineError::from)
        }) {
            Ok(signals) => debug!(?signals, "public signals"),
            Err(e) => warn!(path = %public.display(), error = %e, "could not preview public signals"),
        }
        Ok(())
    }

    async fn verify(&self, state: &mut RunState) -> Result<(), PipelineError> {
        let vkey = self.dirs.verification_key();
        let public = self.dirs.public_signals();
        let proof = self.dirs.proof();
        for artifact in [&vkey, &public, &proof] {
            require_artifact(artifact)?;
        }

        let output = self
            .toolchain
            .run(Invocation::Verify {
                vkey: &vkey,
                public: &public,
                proof: &proof,
            })
            .await?
            .stdout;

        if !verification_accepted(&output) {
            return Err(PipelineError::VerificationRejected { output });
        }
        info!(output = %output, "proof verified");
        state.verification_output = Some(output);
        Ok(())
    }

    async fn interpret(&self, state: &mut RunState) -> Result<(), PipelineError> {
        let witness = self.dirs.witness();
        let json = self.dirs.witness_json();
        require_artifact(&witness)?;

        self.toolchain
            .run(Invocation::ExportWitness {
                witness: &witness,
                json: &json,
            })
            .await?;

        let malformed = |e: zk_proofs::ZkError| PipelineError::MalformedArtifact {
            path: json.clone(),
            reason: e.to_string(),
        };
        let readback = WitnessReadback::from_json(&read_artifact(&json)?).map_err(malformed)?;
        let verdict = interpret(&readback, &state.commitment()?.root, self.config.kind).map_err(malformed)?;

        if verdict.authentic {
            info!(root = %verdict.circuit_root, "circuit root matches the dataset commitment");
        } else {
            warn!(
                circuit_root = %verdict.circuit_root,
                expected_root = %verdict.expected_root,
                "circuit root does not match the dataset commitment"
            );
        }
        if verdict.root_matches == Some(false) {
            warn!(
                expected_root = %verdict.expected_root,
                "circuit reports that the supplied expectedRoot does not match its root"
            );
        }
        match verdict.unique {
            Some(true) => info!("no duplicate rows"),
            Some(false) => warn!("dataset contains duplicate rows"),
            None => info!("uniqueness not evaluated by this circuit"),
        }

        state.verdict = Some(verdict);
        Ok(())
    }

    fn report(&self, dataset: &Dataset, state: RunState) -> Result<RunReport, PipelineError> {
        let missing = |what| PipelineError::OutOfOrder { missing: what };
        let shape = state.commitment()?.shape;
        let estimated_constraints = state.circuit()?.estimated_constraints();

        let report = RunReport {
            run_id: state.run_id,
            dataset: dataset.name.clone(),
            kind: self.config.kind,
            circuit_name: self.config.circuit_name.clone(),
            started_at: state.started_at,
            finished_at: Utc::now(),
            shape,
            estimated_constraints,
            constraints: state.constraints.ok_or_else(|| missing("constraint count"))?,
            ptau: state.ptau.ok_or_else(|| missing("setup parameters"))?,
            verdict: state.verdict.ok_or_else(|| missing("verdict"))?,
            verification_output: state.verification_output.ok_or_else(|| missing("verification output"))?,
            stages: state.stages,
        };

        write_json(&self.dirs.run_report(), &report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExitInfo;
    use crate::toolchain::ToolOutput;
    use ark_bn254::Fr;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use zk_proofs::poseidon::CircomPoseidon;
    use zk_proofs::ptau::hermez_file_name;
    use zk_proofs::types::CircuitKind;

    /// Stands in for circom and snarkjs by writing the files each real step would produce.
    struct FakeToolchain {
        witness: Vec<String>,
        constraint_info: String,
        verify_output: String,
        fail_step: Option<&'static str>,
        skip_output_of: Option<&'static str>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeToolchain {
        fn new(witness: Vec<String>) -> Self {
            Self {
                witness,
                constraint_info: "[INFO]  snarkJS: # of Constraints: 1500".to_string(),
                verify_output: "[INFO]  snarkJS: OK!".to_string(),
                fail_step: None,
                skip_output_of: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn touch(path: &Path) {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"artifact").unwrap();
        }
    }

    impl Toolchain for FakeToolchain {
        async fn run(&self, invocation: Invocation<'_>) -> Result<ToolOutput, PipelineError> {
            let step = invocation.label();
            self.calls.lock().unwrap().push(step);

            if self.fail_step == Some(step) {
                return Err(PipelineError::ExternalToolFailure {
                    tool: invocation.tool().to_string(),
                    exit: ExitInfo {
                        code: Some(1),
                        stderr: "boom".to_string(),
                    },
                });
            }
            if self.skip_output_of == Some(step) {
                return Ok(ToolOutput::default());
            }

            let mut stdout = String::new();
            match invocation {
                Invocation::Compile { circuit, out_dir, .. } => {
                    let name = circuit.file_stem().unwrap().to_string_lossy().into_owned();
                    Self::touch(&out_dir.join(format!("{name}.r1cs")));
                    Self::touch(&out_dir.join(format!("{name}_js/{name}.wasm")));
                    Self::touch(&out_dir.join(format!("{name}_js/generate_witness.js")));
                }
                Invocation::GenerateWitness { witness, .. } => Self::touch(witness),
                Invocation::ConstraintInfo { .. } => stdout = self.constraint_info.clone(),
                Invocation::Setup { zkey, .. } => Self::touch(zkey),
                Invocation::ExportVerificationKey { vkey, .. } => Self::touch(vkey),
                Invocation::Prove { proof, public, .. } => {
                    Self::touch(proof);
                    fs::write(public, serde_json::to_string(&self.witness[1..2]).unwrap()).unwrap();
                }
                Invocation::Verify { .. } => stdout = self.verify_output.clone(),
                Invocation::ExportWitness { json, .. } => {
                    fs::write(json, serde_json::to_string(&self.witness).unwrap()).unwrap();
                }
            }
            Ok(ToolOutput { stdout })
        }
    }

    struct Fixture {
        _tmp: TempDir,
        config: PipelineConfig,
        dataset: Dataset,
    }

    fn fixture(rows: &[&[&str]], kind: CircuitKind) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let ptau_dir = tmp.path().join("ptau");
        fs::create_dir_all(&ptau_dir).unwrap();
        for k in [10, 12] {
            fs::write(ptau_dir.join(hermez_file_name(k)), b"").unwrap();
        }
        let config = PipelineConfig::new(kind, tmp.path().join("generated"), ptau_dir);
        let dataset = Dataset {
            name: "test".to_string(),
            rows: rows.iter().map(|r| Row::new(r.iter().copied())).collect(),
        };
        Fixture {
            _tmp: tmp,
            config,
            dataset,
        }
    }

    /// Witness the real circuit would produce for `dataset`.
    fn honest_witness(dataset: &Dataset, kind: CircuitKind) -> Vec<String> {
        let mut builder = CommitmentBuilder::new(CircomPoseidon::new().unwrap());
        let commitment = builder.commit(&dataset.rows).unwrap();
        let circuit = CircuitSpec::for_shape(kind, commitment.shape);
        let out = circuit
            .evaluate(&commitment.leaves, Some(&commitment.root), builder.hasher_mut())
            .unwrap();
        let mut witness = vec!["1".to_string(), fr_to_decimal(&out.root)];
        witness.extend(out.root_matches.iter().map(fr_to_decimal));
        witness.extend(out.is_unique.iter().map(fr_to_decimal));
        witness
    }

    fn pipeline(fx: &Fixture, toolchain: FakeToolchain) -> Pipeline<FakeToolchain, CircomPoseidon> {
        Pipeline::new(fx.config.clone(), toolchain, CircomPoseidon::new().unwrap())
    }

    #[tokio::test]
    async fn runs_every_stage_in_order() {
        let fx = fixture(&[&["a", "1"], &["b", "2"]], CircuitKind::Uniqueness);
        let witness = honest_witness(&fx.dataset, CircuitKind::Uniqueness);
        let mut pipeline = pipeline(&fx, FakeToolchain::new(witness));

        let report = pipeline.run(&fx.dataset).await.unwrap();

        let stages: Vec<_> = report.stages.iter().map(|r| r.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
        assert_eq!(
            pipeline.toolchain().calls(),
            [
                "compile",
                "generate witness",
                "r1cs info",
                "groth16 setup",
                "export verification key",
                "groth16 prove",
                "groth16 verify",
                "export witness",
            ]
        );

        assert!(report.verdict.authentic);
        assert_eq!(report.verdict.unique, Some(true));
        assert_eq!(report.constraints, 1500);
        assert!(report.ptau.ends_with(hermez_file_name(12)));
        assert_eq!(report.shape.num_leaves(), 2);

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(pipeline.dirs().run_report()).unwrap()).unwrap();
        assert_eq!(saved["dataset"], "test");
        assert_eq!(saved["stages"].as_array().unwrap().len(), Stage::COUNT);
    }

    #[tokio::test]
    async fn writes_circuit_and_proof_input() {
        let fx = fixture(&[&["a"], &["b"], &["c"]], CircuitKind::Uniqueness);
        let witness = honest_witness(&fx.dataset, CircuitKind::Uniqueness);
        let mut pipeline = pipeline(&fx, FakeToolchain::new(witness));
        pipeline.run(&fx.dataset).await.unwrap();

        let circuit = fs::read_to_string(pipeline.dirs().circuit_source()).unwrap();
        assert!(circuit.contains("template PoseidonMerkleTree4()"));

        let input: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(pipeline.dirs().proof_input()).unwrap()).unwrap();
        assert_eq!(input["leaves"].as_array().unwrap().len(), 4);
        assert_eq!(input["leaves"][3], "0");
        assert!(input["expectedRoot"].is_string());
    }

    #[tokio::test]
    async fn duplicates_are_reported_not_fatal() {
        let fx = fixture(&[&["x"], &["x"]], CircuitKind::Uniqueness);
        let witness = honest_witness(&fx.dataset, CircuitKind::Uniqueness);
        let mut pipeline = pipeline(&fx, FakeToolchain::new(witness));

        let report = pipeline.run(&fx.dataset).await.unwrap();
        assert!(report.verdict.authentic);
        assert_eq!(report.verdict.unique, Some(false));
    }

    #[tokio::test]
    async fn completeness_run_skips_uniqueness() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Completeness);
        let witness = honest_witness(&fx.dataset, CircuitKind::Completeness);
        let mut pipeline = pipeline(&fx, FakeToolchain::new(witness));

        let report = pipeline.run(&fx.dataset).await.unwrap();
        assert!(report.verdict.authentic);
        assert_eq!(report.verdict.unique, None);

        let input: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(pipeline.dirs().proof_input()).unwrap()).unwrap();
        assert!(input.get("expectedRoot").is_none());
    }

    #[tokio::test]
    async fn forged_circuit_root_is_not_authentic() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut witness = honest_witness(&fx.dataset, CircuitKind::Uniqueness);
        witness[1] = fr_to_decimal(&Fr::from(7u64));
        let mut pipeline = pipeline(&fx, FakeToolchain::new(witness));

        let report = pipeline.run(&fx.dataset).await.unwrap();
        assert!(!report.verdict.authentic);
        assert_eq!(report.verdict.circuit_root, "7");
    }

    /// Log sink for asserting on emitted events.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn expected_root_mismatch_is_logged() {
        let logs = CapturedLogs::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut witness = honest_witness(&fx.dataset, CircuitKind::Uniqueness);
        witness[2] = "5".to_string();
        let mut pipeline = pipeline(&fx, FakeToolchain::new(witness));

        let report = pipeline.run(&fx.dataset).await.unwrap();
        assert!(report.verdict.authentic);
        assert_eq!(report.verdict.root_matches, Some(false));

        let text = logs.text();
        assert!(text.contains("WARN"));
        assert!(text.contains("supplied expectedRoot does not match"));
    }

    #[tokio::test]
    async fn tool_failure_stops_at_its_stage() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut toolchain = FakeToolchain::new(honest_witness(&fx.dataset, CircuitKind::Uniqueness));
        toolchain.fail_step = Some("groth16 setup");
        let mut pipeline = pipeline(&fx, toolchain);

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::TrustedSetupDone);
        assert!(matches!(failure.cause, PipelineError::ExternalToolFailure { .. }));
        assert_eq!(pipeline.toolchain().calls().last(), Some(&"groth16 setup"));
        assert!(!pipeline.dirs().run_report().exists());
    }

    #[tokio::test]
    async fn missing_artifact_fails_the_producing_stage() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut toolchain = FakeToolchain::new(honest_witness(&fx.dataset, CircuitKind::Uniqueness));
        toolchain.skip_output_of = Some("generate witness");
        let mut pipeline = pipeline(&fx, toolchain);

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::WitnessGenerated);
        match failure.cause {
            PipelineError::ArtifactMissing { path } => assert_eq!(path, pipeline.dirs().witness()),
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_constraint_count_is_malformed() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut toolchain = FakeToolchain::new(honest_witness(&fx.dataset, CircuitKind::Uniqueness));
        toolchain.constraint_info = "[INFO]  snarkJS: Curve: bn-128".to_string();
        let mut pipeline = pipeline(&fx, toolchain);

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::TrustedSetupDone);
        assert!(matches!(failure.cause, PipelineError::MalformedArtifact { .. }));
    }

    #[tokio::test]
    async fn oversized_circuit_has_no_parameters() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut toolchain = FakeToolchain::new(honest_witness(&fx.dataset, CircuitKind::Uniqueness));
        toolchain.constraint_info = "# of Constraints: 100000".to_string();
        let mut pipeline = pipeline(&fx, toolchain);

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::TrustedSetupDone);
        assert!(matches!(
            failure.cause,
            PipelineError::Zk(zk_proofs::ZkError::NoSuitableParameters { required: 100000, .. })
        ));
    }

    #[tokio::test]
    async fn rejected_proof_fails_verification() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let mut toolchain = FakeToolchain::new(honest_witness(&fx.dataset, CircuitKind::Uniqueness));
        toolchain.verify_output = "[ERROR] snarkJS: Invalid proof".to_string();
        let mut pipeline = pipeline(&fx, toolchain);

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::Verified);
        assert!(matches!(failure.cause, PipelineError::VerificationRejected { .. }));
    }

    #[tokio::test]
    async fn empty_dataset_fails_init() {
        let fx = fixture(&[], CircuitKind::Uniqueness);
        let mut pipeline = pipeline(&fx, FakeToolchain::new(Vec::new()));

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::Init);
        assert!(matches!(failure.cause, PipelineError::Zk(zk_proofs::ZkError::EmptyDataset)));
        assert!(pipeline.toolchain().calls().is_empty());
    }

    #[tokio::test]
    async fn init_destroys_previous_run_output() {
        let fx = fixture(&[&["a"], &["b"]], CircuitKind::Uniqueness);
        let stale = fx.config.work_dir.join("snarkjs").join("proof.json");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "stale").unwrap();

        let mut toolchain = FakeToolchain::new(Vec::new());
        toolchain.fail_step = Some("compile");
        let mut pipeline = pipeline(&fx, toolchain);

        let failure = pipeline.run(&fx.dataset).await.unwrap_err();
        assert_eq!(failure.stage, Stage::Compiled);
        assert!(!stale.exists());
        assert!(pipeline.dirs().proof_input().exists());
    }
}
