//! Domain values an action is proven over.
//!
//! These are what callers hand to the orchestrator: coordinates, committed
//! locations, keys and ship movements. Circuit-specific encodings are derived
//! from them in [`crate::witness`] and [`crate::calldata`].

use serde::{Deserialize, Serialize};

use crate::field::{Address, Coords, FieldValue};
use crate::kind::CircuitKind;

/// World parameters shared by every circuit.
///
/// Mirrors the `[initializers]` table of the game's deployment config, so it
/// deserializes straight from that file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameParams {
    #[serde(rename = "PLANETHASH_KEY")]
    pub planethash_key: FieldValue,
    #[serde(rename = "SPACETYPE_KEY")]
    pub spacetype_key: FieldValue,
    #[serde(rename = "BIOMEBASE_KEY")]
    pub biomebase_key: FieldValue,
    #[serde(rename = "PERLIN_LENGTH_SCALE")]
    pub perlin_length_scale: FieldValue,
    #[serde(rename = "WORLD_RADIUS_MIN")]
    pub world_radius_min: FieldValue,
}

/// A committed planet location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Location hash; also the planet id on-chain.
    pub commitment: FieldValue,
    pub perlin: u64,
    #[serde(default)]
    pub dist_from_origin: u64,
    #[serde(default)]
    pub biomebase: u64,
}

impl Location {
    pub fn new(commitment: FieldValue, perlin: u64) -> Self {
        Self {
            commitment,
            perlin,
            dist_from_origin: 0,
            biomebase: 0,
        }
    }
}

/// Spawn a player on a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub coords: Coords,
    pub location: Location,
}

/// Publish a planet's coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRequest {
    pub coords: Coords,
    pub location: Location,
}

/// Send ships, resources and optionally an artifact between planets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Coords,
    pub to: Coords,
    pub from_location: Location,
    pub to_location: Location,
    pub max_distance: u64,
    pub population_moved: u64,
    pub silver_moved: u64,
    /// Artifact or spaceship id, zero when nothing is carried.
    #[serde(default)]
    pub artifact_id: FieldValue,
    #[serde(default)]
    pub abandoning: bool,
}

/// Redeem a whitelist key for a recipient.
///
/// `key_hash` comes from the external key-derivation scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistRequest {
    pub key: FieldValue,
    pub key_hash: FieldValue,
    pub recipient: Address,
}

/// Prove a planet's biome base to prospect an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomebaseRequest {
    pub coords: Coords,
    pub location: Location,
}

/// One action the orchestrator can prepare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Init(InitRequest),
    Reveal(RevealRequest),
    Move(MoveRequest),
    Whitelist(WhitelistRequest),
    Biomebase(BiomebaseRequest),
}

impl ActionRequest {
    pub fn kind(&self) -> CircuitKind {
        match self {
            ActionRequest::Init(_) => CircuitKind::Init,
            ActionRequest::Reveal(_) => CircuitKind::Reveal,
            ActionRequest::Move(_) => CircuitKind::Move,
            ActionRequest::Whitelist(_) => CircuitKind::Whitelist,
            ActionRequest::Biomebase(_) => CircuitKind::Biomebase,
        }
    }
}
