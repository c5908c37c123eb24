//! Per-action proof pipeline.
//!
//! [`Orchestrator::prepare`] runs one action end to end:
//!
//! ```text
//! ActionRequest
//!   → WitnessBuilder          (witness document)
//!   → ContentHash             (witness ∥ circuit source)
//!   → ProofCache              (hit: reuse artifact)
//!   → Prover                  (miss: generate, then store)
//!   → CallArgumentAssembler   (public inputs + proof)
//! ```
//!
//! No state is kept between actions besides the durable cache. Actions for
//! the same circuit must not be prepared concurrently, since provers write
//! into the circuit directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use df_zk::{
    ActionRequest, CallArgs, CallArgumentAssembler, CalldataShapeError, CircuitHandle,
    CircuitKind, CircuitRevision, EncodingError, GameParams, InProcessProver, NargoProver,
    ProofError, Prover, StubEngine, WitnessBuilder, WitnessInput,
};

use crate::config::{ConfigError, OrchestratorConfig, ProverBackendKind, load_game_params};
use crate::metrics::ProofMetrics;
use crate::repository::{
    ArtifactMetadata, CacheWriteError, ContentHash, FileProofCache, ProofArtifact, ProofCache,
    TestCaseId,
};

/// Errors that abort preparing an action.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no circuit registered for {0}")]
    UnknownCircuit(CircuitKind),

    #[error("failed to read circuit source in {dir}: {source}")]
    CircuitSource {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error("failed to cache proof: {0}")]
    CacheWrite(#[from] CacheWriteError),

    #[error("call arguments do not match the verifier: {0}")]
    Calldata(#[from] CalldataShapeError),
}

/// Whether the proof came from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// Everything needed to send one action.
#[derive(Debug, Clone)]
pub struct PreparedAction {
    pub call_args: CallArgs,
    pub artifact: ProofArtifact,
    pub status: CacheStatus,
}

#[derive(Debug, Clone)]
struct CircuitSetup {
    handle: CircuitHandle,
    revision: CircuitRevision,
}

pub struct Orchestrator {
    params: GameParams,
    circuits: BTreeMap<CircuitKind, CircuitSetup>,
    prover: Box<dyn Prover>,
    cache: Box<dyn ProofCache>,
    metrics: Arc<ProofMetrics>,
}

impl Orchestrator {
    pub fn new(
        params: GameParams,
        prover: impl Prover + 'static,
        cache: impl ProofCache + 'static,
    ) -> Self {
        Self {
            params,
            circuits: BTreeMap::new(),
            prover: Box::new(prover),
            cache: Box::new(cache),
            metrics: Arc::new(ProofMetrics::new()),
        }
    }

    /// Register the circuit serving `handle.kind()`, replacing any earlier one.
    pub fn with_circuit(mut self, handle: CircuitHandle, revision: CircuitRevision) -> Self {
        self.circuits
            .insert(handle.kind(), CircuitSetup { handle, revision });
        self
    }

    /// Build the prover, cache and circuit table described by `config`.
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, OrchestratorError> {
        let params = load_game_params(&config.game_config)?;
        let cache = FileProofCache::new(config.cache_dir())?;

        let prover: Box<dyn Prover> = match config.prover.backend {
            ProverBackendKind::Nargo => Box::new(
                NargoProver::with_command(&config.prover.program, config.prover.args.clone())
                    .with_timeout(config.prover.timeout()),
            ),
            ProverBackendKind::Stub => {
                tracing::warn!("Using stub proving engine; proofs will not verify on-chain");
                Box::new(InProcessProver::new(StubEngine::new()))
            }
        };

        let mut orchestrator = Self::new(params, prover, cache);
        for (&kind, circuit) in &config.circuits {
            let handle = config.circuit_handle(kind)?;
            orchestrator = orchestrator.with_circuit(handle, circuit.revision());
        }

        tracing::info!(
            "Orchestrator ready: {} circuits, backend {}, cache {}",
            orchestrator.circuits.len(),
            config.prover.backend,
            config.cache_dir().display()
        );
        Ok(orchestrator)
    }

    pub fn params(&self) -> &GameParams {
        &self.params
    }

    pub fn metrics(&self) -> Arc<ProofMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn cache(&self) -> &dyn ProofCache {
        self.cache.as_ref()
    }

    pub fn circuit(&self, kind: CircuitKind) -> Option<&CircuitHandle> {
        self.circuits.get(&kind).map(|setup| &setup.handle)
    }

    /// Produce call arguments for `request`, proving only if the cached proof
    /// for `test_case` no longer matches the witness or circuit source.
    ///
    /// A failed proof leaves the cache untouched. Proofs cached by a
    /// different backend are regenerated.
    pub fn prepare(
        &self,
        test_case: &TestCaseId,
        request: &ActionRequest,
    ) -> Result<PreparedAction, OrchestratorError> {
        let kind = request.kind();
        let setup = self
            .circuits
            .get(&kind)
            .ok_or(OrchestratorError::UnknownCircuit(kind))?;
        if kind == CircuitKind::Move && setup.revision.move_layout.is_none() {
            return Err(CalldataShapeError::MissingMoveLayout { kind }.into());
        }

        let witness = WitnessBuilder::new(&self.params, &setup.revision).build(request);
        let document = witness.to_toml()?;
        let source = setup
            .handle
            .read_source()
            .map_err(|source| OrchestratorError::CircuitSource {
                dir: setup.handle.dir().to_path_buf(),
                source,
            })?;
        let hash = ContentHash::compute(document.as_bytes(), &source);

        let (artifact, status) = match self.cached(kind, test_case, &hash) {
            Some(artifact) => {
                self.metrics.record_hit();
                tracing::info!("Using cached {kind} proof for {test_case}");
                (artifact, CacheStatus::Hit)
            }
            None => {
                self.metrics.record_miss();
                tracing::info!("Generating {kind} proof for {test_case}");
                let artifact = self.generate(&setup.handle, &witness, hash)?;
                self.cache.store(test_case, &artifact)?;
                (artifact, CacheStatus::Miss)
            }
        };

        let call_args = CallArgumentAssembler::new(&self.params, &setup.revision)
            .assemble(request, artifact.bytes().clone())?;

        Ok(PreparedAction {
            call_args,
            artifact,
            status,
        })
    }

    fn cached(
        &self,
        kind: CircuitKind,
        test_case: &TestCaseId,
        hash: &ContentHash,
    ) -> Option<ProofArtifact> {
        let entry = self.cache.lookup(kind, test_case)?;
        if !self.cache.is_valid(&entry, hash) {
            return None;
        }
        let backend = self.prover.backend();
        if entry.metadata.backend != backend {
            tracing::info!(
                "Cached {kind} proof for {test_case} came from {:?}, need {:?}",
                entry.metadata.backend,
                backend
            );
            return None;
        }
        self.cache.load_artifact(&entry)
    }

    fn generate(
        &self,
        circuit: &CircuitHandle,
        witness: &WitnessInput,
        hash: ContentHash,
    ) -> Result<ProofArtifact, OrchestratorError> {
        let started = Instant::now();
        let bytes = match self.prover.prove(circuit, witness) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.metrics.record_failure();
                tracing::error!("{} proof failed: {}", circuit.kind(), e);
                return Err(e.into());
            }
        };
        let elapsed = started.elapsed();
        self.metrics.record_success(elapsed);
        tracing::info!(
            "Generated {} proof ({} bytes, {}ms)",
            circuit.kind(),
            bytes.len(),
            elapsed.as_millis()
        );

        Ok(ProofArtifact::new(
            bytes,
            ArtifactMetadata {
                circuit_kind: circuit.kind(),
                content_hash: hash,
                generated_at: Utc::now(),
                backend: self.prover.backend(),
            },
        ))
    }
}
