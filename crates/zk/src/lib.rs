//! Circuit-facing half of the proof pipeline.
//!
//! Turns domain values (coordinates, committed locations, keys, ship moves)
//! into the two encodings a proof needs:
//! - a witness document the prover consumes ([`WitnessBuilder`])
//! - the contract call arguments the verifier consumes
//!   ([`CallArgumentAssembler`])
//!
//! and generates the proof in between through a [`Prover`] backend:
//! - **NargoProver**: the `nargo` toolchain as a child process
//! - **InProcessProver**: a compiled circuit driven by a [`ProvingEngine`]
//! - **StubProver**: in-process with [`StubEngine`], for fast iteration
//!
//! Caching and orchestration live in `df-runtime`.

pub mod action;
pub mod backend;
pub mod calldata;
pub mod circuit;
pub mod field;
pub mod kind;
pub mod prover;
pub mod revision;
pub mod witness;

#[cfg(test)]
mod test_helpers;

pub use action::{
    ActionRequest, BiomebaseRequest, GameParams, InitRequest, Location, MoveRequest,
    RevealRequest, WhitelistRequest,
};
pub use backend::{CompiledCircuit, InProcessProver, NargoProver, ProvingEngine, StubEngine, StubProver};
pub use calldata::{CallArgs, CallArgumentAssembler, CallValue, CalldataShapeError};
pub use circuit::CircuitHandle;
pub use field::{Address, Coords, EncodingError, FieldValue, HexWidth, SignedField};
pub use kind::CircuitKind;
pub use prover::{ProofBackend, ProofBytes, ProofError, Prover, ProverProcessError};
pub use revision::{CircuitRevision, MoveLayout};
pub use witness::{WitnessBuilder, WitnessInput, WitnessValue};
