//! Witness documents for the prover.
//!
//! Turns an [`ActionRequest`] into the ordered parameter table a circuit
//! reads from `Prover.toml`. The serialized form is also what the proof cache
//! hashes, so building is deterministic: same request, params and revision
//! give byte-identical TOML.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::action::{
    ActionRequest, BiomebaseRequest, GameParams, InitRequest, MoveRequest, RevealRequest,
    WhitelistRequest,
};
use crate::field::{Address, Coords, EncodingError, FieldValue, HexWidth, SignedField};
use crate::revision::CircuitRevision;

// ============================================================================
// Witness values
// ============================================================================

/// One circuit parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WitnessValue {
    /// Rendered as a padded hex string.
    Field { value: FieldValue, width: HexWidth },
    Address(Address),
    Bool(bool),
    /// Nested struct parameter (points, signed coordinates).
    Table(WitnessInput),
}

impl WitnessValue {
    pub fn field(value: FieldValue, width: HexWidth) -> Self {
        WitnessValue::Field { value, width }
    }

    pub fn as_field(&self) -> Option<FieldValue> {
        match self {
            WitnessValue::Field { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&WitnessInput> {
        match self {
            WitnessValue::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl Serialize for WitnessValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WitnessValue::Field { value, width } => serializer.serialize_str(&value.to_hex(*width)),
            WitnessValue::Address(address) => serializer.collect_str(address),
            WitnessValue::Bool(flag) => serializer.serialize_bool(*flag),
            WitnessValue::Table(table) => table.serialize(serializer),
        }
    }
}

/// Ordered mapping from circuit parameter name to value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WitnessInput {
    entries: Vec<(String, WitnessValue)>,
}

impl WitnessInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Names are expected to be unique.
    pub fn with(mut self, name: &str, value: WitnessValue) -> Self {
        debug_assert!(self.get(name).is_none(), "duplicate witness parameter `{name}`");
        self.entries.push((name.to_string(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&WitnessValue> {
        self.entries
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Follow nested tables, e.g. `["point", "x", "x"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&WitnessValue> {
        let (last, parents) = path.split_last()?;
        let mut table = self;
        for name in parents {
            table = table.get(name)?.as_table()?;
        }
        table.get(last)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `Prover.toml` document; canonical bytes for hashing.
    pub fn to_toml(&self) -> Result<String, EncodingError> {
        toml::to_string(self).map_err(|e| EncodingError::Serialization(e.to_string()))
    }
}

impl Serialize for WitnessInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds witnesses for one circuit revision and set of world parameters.
///
/// Holds no state of its own; both inputs are passed in explicitly.
#[derive(Debug, Clone, Copy)]
pub struct WitnessBuilder<'a> {
    params: &'a GameParams,
    revision: &'a CircuitRevision,
}

impl<'a> WitnessBuilder<'a> {
    pub fn new(params: &'a GameParams, revision: &'a CircuitRevision) -> Self {
        Self { params, revision }
    }

    pub fn build(&self, request: &ActionRequest) -> WitnessInput {
        match request {
            ActionRequest::Init(req) => self.init(req),
            ActionRequest::Reveal(req) => self.reveal(req),
            ActionRequest::Move(req) => self.move_(req),
            ActionRequest::Whitelist(req) => self.whitelist(req),
            ActionRequest::Biomebase(req) => self.biomebase(req),
        }
    }

    pub fn init(&self, req: &InitRequest) -> WitnessInput {
        WitnessInput::new()
            .with("commit", commitment(req.location.commitment))
            .with("perlin", self.value(req.location.perlin.into()))
            .with("planethash_key", self.value(self.params.planethash_key))
            .with("r", self.value(self.params.world_radius_min))
            .with("scale", self.value(self.params.perlin_length_scale))
            .with("spacetype_key", self.value(self.params.spacetype_key))
            .with("point", self.point(req.coords))
    }

    pub fn reveal(&self, req: &RevealRequest) -> WitnessInput {
        WitnessInput::new()
            .with("commit", commitment(req.location.commitment))
            .with("perlin", self.value(req.location.perlin.into()))
            .with("planethash_key", self.value(self.params.planethash_key))
            .with("scale", self.value(self.params.perlin_length_scale))
            .with("spacetype_key", self.value(self.params.spacetype_key))
            .with("point", self.point(req.coords))
    }

    pub fn move_(&self, req: &MoveRequest) -> WitnessInput {
        WitnessInput::new()
            .with("from", self.point(req.from))
            .with("to", self.point(req.to))
            .with("commit1", commitment(req.from_location.commitment))
            .with("commit2", commitment(req.to_location.commitment))
            .with("newPerlin", self.value(req.to_location.perlin.into()))
            .with("r", self.value(self.params.world_radius_min))
            .with("planethash_key", self.value(self.params.planethash_key))
            .with("spacetype_key", self.value(self.params.spacetype_key))
            .with("scale", self.value(self.params.perlin_length_scale))
            .with("max_move", self.value(req.max_distance.into()))
    }

    /// Key is byte-aligned and the hash full width regardless of revision;
    /// both are fixed by the key-derivation scheme, not the circuit.
    pub fn whitelist(&self, req: &WhitelistRequest) -> WitnessInput {
        WitnessInput::new()
            .with("key", WitnessValue::field(req.key, HexWidth::ByteAligned))
            .with("key_hash", WitnessValue::field(req.key_hash, HexWidth::Word))
            .with("recipient", WitnessValue::Address(req.recipient))
    }

    pub fn biomebase(&self, req: &BiomebaseRequest) -> WitnessInput {
        WitnessInput::new()
            .with("commit", commitment(req.location.commitment))
            .with("biomebase", self.value(req.location.biomebase.into()))
            .with("planethash_key", self.value(self.params.planethash_key))
            .with("biomebase_key", self.value(self.params.biomebase_key))
            .with("scale", self.value(self.params.perlin_length_scale))
            .with("point", self.point(req.coords))
    }

    fn value(&self, value: FieldValue) -> WitnessValue {
        WitnessValue::field(value, self.revision.value_width)
    }

    fn point(&self, coords: Coords) -> WitnessValue {
        let (x, y) = coords.signed();
        WitnessValue::Table(
            WitnessInput::new()
                .with("x", self.signed(x))
                .with("y", self.signed(y)),
        )
    }

    fn signed(&self, value: SignedField) -> WitnessValue {
        WitnessValue::Table(
            WitnessInput::new()
                .with("x", self.value(value.magnitude))
                .with("is_neg", WitnessValue::Bool(value.is_negative)),
        )
    }
}

/// Commitments are hashes and always travel at full width.
fn commitment(value: FieldValue) -> WitnessValue {
    WitnessValue::field(value, HexWidth::Word)
}
