//! Circuit identifiers.
//!
//! Every per-circuit rule in this crate (witness layout, calldata shape,
//! contract entrypoint) is an exhaustive `match` over [`CircuitKind`], so
//! adding a circuit is a compile error until every table knows about it.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The circuits gating on-chain game actions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitKind {
    Init,
    Reveal,
    Move,
    Whitelist,
    Biomebase,
}

impl CircuitKind {
    /// Number of public inputs the verifying contract expects, proof excluded.
    pub const fn public_input_arity(self) -> usize {
        match self {
            CircuitKind::Init => 6,
            CircuitKind::Reveal => 9,
            CircuitKind::Move => 12,
            CircuitKind::Whitelist => 2,
            CircuitKind::Biomebase => 5,
        }
    }

    /// Contract function that consumes this circuit's call arguments.
    pub const fn entrypoint(self) -> &'static str {
        match self {
            CircuitKind::Init => "initializePlayer",
            CircuitKind::Reveal => "revealLocation",
            CircuitKind::Move => "move",
            CircuitKind::Whitelist => "useKey",
            CircuitKind::Biomebase => "findArtifact",
        }
    }

    /// Directory (and nargo package) name used when none is configured.
    pub fn default_dir_name(self) -> &'static str {
        self.into()
    }
}
