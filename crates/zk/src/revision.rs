//! Versioned encoding choices per circuit.
//!
//! Deployed circuits have changed their input encoding over time without a
//! version field anywhere on-chain. Each choice that has varied is a named
//! variant here and must be picked explicitly in configuration.

use serde::{Deserialize, Serialize};

use crate::field::HexWidth;

/// What the Move calldata carries in its fourth slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveLayout {
    /// The world's minimum radius (current verifier).
    MinRadius,
    /// The destination's distance from origin plus one (earlier verifier).
    DistanceFromOrigin,
}

/// Encoding agreed with one revision of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitRevision {
    /// Padding for perlin values, coordinates, distances and game parameters.
    pub value_width: HexWidth,

    /// Required for the Move circuit, ignored elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_layout: Option<MoveLayout>,
}

impl CircuitRevision {
    pub const fn new(value_width: HexWidth) -> Self {
        Self {
            value_width,
            move_layout: None,
        }
    }

    pub const fn with_move_layout(mut self, layout: MoveLayout) -> Self {
        self.move_layout = Some(layout);
        self
    }
}
