//! Proving backend implementations.
//!
//! # Available Backends
//!
//! - **NargoProver**: writes `Prover.toml`, runs the nargo toolchain as a
//!   child process in the circuit directory and reads the proof file back
//! - **InProcessProver**: loads the compiled circuit and proves through a
//!   [`ProvingEngine`] in memory; [`StubEngine`] is the engine shipped here
//!
//! The orchestrator picks one at runtime from its configuration.

mod in_process;
mod nargo;

pub use in_process::{
    AbiParameter, CircuitAbi, CompiledCircuit, InProcessProver, ProvingEngine, StubEngine,
};
pub use nargo::NargoProver;

/// In-process prover backed by the stub engine.
pub type StubProver = InProcessProver<StubEngine>;
