//! In-process backend: compiled circuit + proving engine, no subprocess.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::circuit::CircuitHandle;
use crate::prover::{ProofBackend, ProofBytes, ProofError, Prover};
use crate::witness::WitnessInput;

/// Parameters declared by a compiled circuit.
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitAbi {
    pub parameters: Vec<AbiParameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbiParameter {
    pub name: String,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Compiled circuit as emitted by `nargo compile` (`target/<package>.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct CompiledCircuit {
    #[serde(default)]
    pub noir_version: Option<String>,
    pub abi: CircuitAbi,
    /// Base64 encoded program bytecode.
    pub bytecode: String,
}

impl CompiledCircuit {
    pub fn load(path: &Path) -> Result<Self, ProofError> {
        let json = fs::read_to_string(path).map_err(|e| {
            ProofError::ProofGeneration(format!(
                "failed to read compiled circuit {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            ProofError::ProofGeneration(format!(
                "malformed compiled circuit {}: {e}",
                path.display()
            ))
        })
    }

    pub fn bytecode_bytes(&self) -> Result<Vec<u8>, ProofError> {
        STANDARD
            .decode(self.bytecode.trim())
            .map_err(|e| ProofError::ProofGeneration(format!("malformed circuit bytecode: {e}")))
    }

    /// Every declared parameter must be present in the witness.
    pub fn check_witness(&self, witness: &WitnessInput) -> Result<(), ProofError> {
        let missing: Vec<_> = self
            .abi
            .parameters
            .iter()
            .filter(|p| witness.get(&p.name).is_none())
            .map(|p| p.name.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProofError::ProofGeneration(format!(
                "witness is missing circuit parameters: {}",
                missing.join(", ")
            )))
        }
    }
}

/// A proving library linked into the process.
pub trait ProvingEngine: Send + Sync {
    fn backend(&self) -> ProofBackend;

    /// Prove `witness` (the serialized witness document) against `bytecode`.
    fn generate(&self, bytecode: &[u8], witness: &[u8]) -> Result<Vec<u8>, ProofError>;
}

/// Loads the compiled circuit and proves in memory through a [`ProvingEngine`].
#[derive(Debug, Clone, Default)]
pub struct InProcessProver<E> {
    engine: E,
}

impl<E: ProvingEngine> InProcessProver<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: ProvingEngine> Prover for InProcessProver<E> {
    fn backend(&self) -> ProofBackend {
        self.engine.backend()
    }

    fn prove(
        &self,
        circuit: &CircuitHandle,
        witness: &WitnessInput,
    ) -> Result<ProofBytes, ProofError> {
        let compiled = CompiledCircuit::load(&circuit.compiled_path())?;
        compiled.check_witness(witness)?;
        let bytecode = compiled.bytecode_bytes()?;
        let document = witness.to_toml()?;

        debug!(
            "Loaded {} circuit ({} bytecode bytes, noir {})",
            circuit.kind(),
            bytecode.len(),
            compiled.noir_version.as_deref().unwrap_or("unknown")
        );

        let proof = self.engine.generate(&bytecode, document.as_bytes())?;
        info!(
            "Generated {} proof in-process ({} bytes, backend: {:?})",
            circuit.kind(),
            proof.len(),
            self.engine.backend()
        );
        Ok(ProofBytes::new(proof))
    }
}

// ============================================================================
// Stub engine
// ============================================================================

const STUB_BLINDING_BYTES: usize = 32;

/// Stub engine for testing and development.
///
/// A "proof" is SHA-256 over bytecode and witness followed by random blinding
/// bytes, so two proofs of the same statement both check out with
/// [`StubEngine::verify`] without being byte-identical.
///
/// **Warning**: Provides no cryptographic guarantees - do not use in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEngine;

impl StubEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, bytecode: &[u8], witness: &[u8], proof: &[u8]) -> bool {
        proof.len() == 32 + STUB_BLINDING_BYTES && proof[..32] == statement_digest(bytecode, witness)
    }
}

impl ProvingEngine for StubEngine {
    fn backend(&self) -> ProofBackend {
        ProofBackend::Stub
    }

    fn generate(&self, bytecode: &[u8], witness: &[u8]) -> Result<Vec<u8>, ProofError> {
        let blinding: [u8; STUB_BLINDING_BYTES] = rand::random();
        let mut proof = statement_digest(bytecode, witness).to_vec();
        proof.extend_from_slice(&blinding);
        Ok(proof)
    }
}

fn statement_digest(bytecode: &[u8], witness: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytecode);
    hasher.update(witness);
    hasher.finalize().into()
}
