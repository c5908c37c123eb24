//! Shared fixtures: a circuits tree with compiled stubs, counting provers and
//! the reference planets.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use df_runtime::{FileProofCache, Orchestrator, TestCaseId};
use df_zk::{
    ActionRequest, Address, CircuitHandle, CircuitKind, CircuitRevision, Coords, FieldValue,
    GameParams, HexWidth, InitRequest, Location, MoveLayout, ProofBackend, ProofBytes,
    ProofError, Prover, StubProver, WhitelistRequest, WitnessInput,
};
use strum::IntoEnumIterator;
use tempfile::TempDir;

pub const PLANET_1_COORDS: Coords = Coords::new(876, 949);
pub const PLANET_1_HASH: &str =
    "0x0000802bc4d6d6db6e2c80c476949ab73fdf9a1100d9bed50d4c24ab1e31d003";
pub const KEY_HASH: u64 = 0x1234;
pub const RECIPIENT: &str = "0x8950bab77f29e8f81e6f78aea0a79badd88eeb13";

pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    /// One compiled stub package per circuit kind under `circuits/`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for kind in CircuitKind::iter() {
            write_circuit(&dir.path().join("circuits").join(kind.to_string()), kind);
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn circuit_dir(&self, kind: CircuitKind) -> PathBuf {
        self.root().join("circuits").join(kind.to_string())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root().join("cache")
    }

    pub fn cache(&self) -> FileProofCache {
        FileProofCache::new(self.cache_dir()).unwrap()
    }

    pub fn edit_source(&self, kind: CircuitKind, body: &str) {
        fs::write(self.circuit_dir(kind).join("src").join("main.nr"), body).unwrap();
    }

    /// Orchestrator over every circuit at full word width.
    pub fn orchestrator(&self, prover: impl Prover + 'static) -> Orchestrator {
        let mut orchestrator = Orchestrator::new(game_params(), prover, self.cache());
        for kind in CircuitKind::iter() {
            let mut revision = CircuitRevision::new(HexWidth::Word);
            if kind == CircuitKind::Move {
                revision = revision.with_move_layout(MoveLayout::MinRadius);
            }
            orchestrator = orchestrator
                .with_circuit(CircuitHandle::new(kind, self.circuit_dir(kind)), revision);
        }
        orchestrator
    }
}

fn abi_parameters(kind: CircuitKind) -> &'static [&'static str] {
    match kind {
        CircuitKind::Init => &[
            "commit",
            "perlin",
            "planethash_key",
            "r",
            "scale",
            "spacetype_key",
            "point",
        ],
        CircuitKind::Reveal => &[
            "commit",
            "perlin",
            "planethash_key",
            "scale",
            "spacetype_key",
            "point",
        ],
        CircuitKind::Move => &[
            "from",
            "to",
            "commit1",
            "commit2",
            "newPerlin",
            "r",
            "planethash_key",
            "spacetype_key",
            "scale",
            "max_move",
        ],
        CircuitKind::Whitelist => &["key", "key_hash", "recipient"],
        CircuitKind::Biomebase => &[
            "commit",
            "biomebase",
            "planethash_key",
            "biomebase_key",
            "scale",
            "point",
        ],
    }
}

fn write_circuit(dir: &Path, kind: CircuitKind) {
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::write(dir.join("src").join("main.nr"), format!("// {kind}\nfn main() {{}}\n")).unwrap();

    let parameters: Vec<_> = abi_parameters(kind)
        .iter()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();
    let compiled = serde_json::json!({
        "abi": { "parameters": parameters },
        "bytecode": STANDARD.encode(format!("acir:{kind}")),
    });
    fs::create_dir_all(dir.join("target")).unwrap();
    fs::write(
        dir.join("target").join(format!("{kind}.json")),
        serde_json::to_vec(&compiled).unwrap(),
    )
    .unwrap();
}

pub fn game_params() -> GameParams {
    GameParams {
        planethash_key: FieldValue::from_u64(7),
        spacetype_key: FieldValue::from_u64(8),
        biomebase_key: FieldValue::from_u64(9),
        perlin_length_scale: FieldValue::from_u64(4096),
        world_radius_min: FieldValue::from_u64(1000),
    }
}

pub fn test_case(id: &str) -> TestCaseId {
    TestCaseId::new(id).unwrap()
}

pub fn planet_1_init() -> ActionRequest {
    init_at(PLANET_1_COORDS)
}

pub fn init_at(coords: Coords) -> ActionRequest {
    ActionRequest::Init(InitRequest {
        coords,
        location: Location::new(PLANET_1_HASH.parse().unwrap(), 16),
    })
}

pub fn whitelist_request() -> ActionRequest {
    ActionRequest::Whitelist(WhitelistRequest {
        key: FieldValue::from_u64(0xabcdef),
        key_hash: FieldValue::from_u64(KEY_HASH),
        recipient: RECIPIENT.parse::<Address>().unwrap(),
    })
}

/// Stub prover that counts how often it is invoked.
#[derive(Clone, Default)]
pub struct CountingProver {
    inner: Arc<StubProver>,
    calls: Arc<AtomicUsize>,
}

impl CountingProver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Prover for CountingProver {
    fn backend(&self) -> ProofBackend {
        self.inner.backend()
    }

    fn prove(
        &self,
        circuit: &CircuitHandle,
        witness: &WitnessInput,
    ) -> Result<ProofBytes, ProofError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.prove(circuit, witness)
    }
}

/// Prover whose every run fails.
pub struct FailingProver;

impl Prover for FailingProver {
    fn backend(&self) -> ProofBackend {
        ProofBackend::Custom
    }

    fn prove(&self, _: &CircuitHandle, _: &WitnessInput) -> Result<ProofBytes, ProofError> {
        Err(ProofError::ProofGeneration("Failed constraint".to_string()))
    }
}
