//! Contract call arguments.
//!
//! Packs public inputs and the proof into the exact tuple each verifying
//! entrypoint expects. The layouts below are a compatibility fence with the
//! deployed contracts: a wrong order or arity is never caught locally, only
//! as an on-chain revert. Change them only after re-deriving the contract's
//! input layout.
//!
//! | Kind      | Public inputs (in order)                                      | Arity |
//! |-----------|---------------------------------------------------------------|-------|
//! | Init      | commitment, perlin, minRadius, planetHashKey, spaceTypeKey, perlinScale | 6 |
//! | Reveal    | commitment, perlin, x, xSign, y, ySign, planetHashKey, spaceTypeKey, perlinScale | 9 |
//! | Move      | fromCommitment, toCommitment, newPerlin, minRadius\*, maxDistance, planetHashKey, spaceTypeKey, perlinScale, populationMoved, silverMoved, artifactId, abandoning | 12 |
//! | Whitelist | keyHash, recipient                                            | 2     |
//! | Biomebase | commitment, biomebase, planetHashKey, biomebaseKey, perlinScale | 5   |
//!
//! \* or `distFromOrigin + 1`, see [`MoveLayout`].

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::action::{
    ActionRequest, BiomebaseRequest, GameParams, InitRequest, MoveRequest, RevealRequest,
    WhitelistRequest,
};
use crate::field::{Address, FieldValue, HexWidth};
use crate::kind::CircuitKind;
use crate::prover::ProofBytes;
use crate::revision::{CircuitRevision, MoveLayout};

/// Assembled tuple disagrees with the verifier layout. Always a bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalldataShapeError {
    #[error("{kind} call takes {expected} public inputs, assembled {actual}")]
    Arity {
        kind: CircuitKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} call has no input slot {index}")]
    SlotOutOfRange { kind: CircuitKind, index: usize },

    #[error("{kind} circuit revision does not name a move layout")]
    MissingMoveLayout { kind: CircuitKind },
}

/// One public input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallValue {
    Uint(FieldValue),
    Address(Address),
}

impl CallValue {
    pub fn as_uint(&self) -> Option<FieldValue> {
        match self {
            CallValue::Uint(value) => Some(*value),
            CallValue::Address(_) => None,
        }
    }
}

impl From<FieldValue> for CallValue {
    fn from(value: FieldValue) -> Self {
        CallValue::Uint(value)
    }
}

impl From<u64> for CallValue {
    fn from(value: u64) -> Self {
        CallValue::Uint(value.into())
    }
}

impl From<Address> for CallValue {
    fn from(value: Address) -> Self {
        CallValue::Address(value)
    }
}

impl Serialize for CallValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallValue::Uint(value) => serializer.serialize_str(&value.to_hex(HexWidth::ByteAligned)),
            CallValue::Address(address) => serializer.collect_str(address),
        }
    }
}

/// Public inputs plus trailing proof for one contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgs {
    kind: CircuitKind,
    inputs: Vec<CallValue>,
    proof: ProofBytes,
}

impl CallArgs {
    pub fn new(
        kind: CircuitKind,
        inputs: Vec<CallValue>,
        proof: ProofBytes,
    ) -> Result<Self, CalldataShapeError> {
        let expected = kind.public_input_arity();
        if inputs.len() != expected {
            return Err(CalldataShapeError::Arity {
                kind,
                expected,
                actual: inputs.len(),
            });
        }
        Ok(Self {
            kind,
            inputs,
            proof,
        })
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn entrypoint(&self) -> &'static str {
        self.kind.entrypoint()
    }

    pub fn inputs(&self) -> &[CallValue] {
        &self.inputs
    }

    pub fn proof(&self) -> &ProofBytes {
        &self.proof
    }

    /// Overwrite one slot, keeping the shape.
    ///
    /// Only the shape is guarded; a semantically wrong value is the
    /// verifier's to reject.
    pub fn replace_input(
        &mut self,
        index: usize,
        value: impl Into<CallValue>,
    ) -> Result<CallValue, CalldataShapeError> {
        let slot = self
            .inputs
            .get_mut(index)
            .ok_or(CalldataShapeError::SlotOutOfRange {
                kind: self.kind,
                index,
            })?;
        Ok(std::mem::replace(slot, value.into()))
    }

    pub fn into_parts(self) -> (Vec<CallValue>, ProofBytes) {
        (self.inputs, self.proof)
    }
}

/// Serializes as `[[inputs...], "0x<proof>"]`.
impl Serialize for CallArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.inputs)?;
        tuple.serialize_element(&self.proof)?;
        tuple.end()
    }
}

// ============================================================================
// Assembler
// ============================================================================

/// Builds [`CallArgs`] from the same request the witness was built from.
///
/// Reads domain values directly rather than witness field names, so renaming
/// a circuit parameter cannot reorder calldata.
#[derive(Debug, Clone, Copy)]
pub struct CallArgumentAssembler<'a> {
    params: &'a GameParams,
    revision: &'a CircuitRevision,
}

impl<'a> CallArgumentAssembler<'a> {
    pub fn new(params: &'a GameParams, revision: &'a CircuitRevision) -> Self {
        Self { params, revision }
    }

    pub fn assemble(
        &self,
        request: &ActionRequest,
        proof: ProofBytes,
    ) -> Result<CallArgs, CalldataShapeError> {
        let inputs = match request {
            ActionRequest::Init(req) => self.init(req),
            ActionRequest::Reveal(req) => self.reveal(req),
            ActionRequest::Move(req) => self.move_(req)?,
            ActionRequest::Whitelist(req) => self.whitelist(req),
            ActionRequest::Biomebase(req) => self.biomebase(req),
        };
        CallArgs::new(request.kind(), inputs, proof)
    }

    fn init(&self, req: &InitRequest) -> Vec<CallValue> {
        let p = self.params;
        vec![
            req.location.commitment.into(),
            req.location.perlin.into(),
            p.world_radius_min.into(),
            p.planethash_key.into(),
            p.spacetype_key.into(),
            p.perlin_length_scale.into(),
        ]
    }

    fn reveal(&self, req: &RevealRequest) -> Vec<CallValue> {
        let p = self.params;
        let (x, y) = req.coords.signed();
        vec![
            req.location.commitment.into(),
            req.location.perlin.into(),
            x.magnitude.into(),
            x.sign_flag().into(),
            y.magnitude.into(),
            y.sign_flag().into(),
            p.planethash_key.into(),
            p.spacetype_key.into(),
            p.perlin_length_scale.into(),
        ]
    }

    fn move_(&self, req: &MoveRequest) -> Result<Vec<CallValue>, CalldataShapeError> {
        let p = self.params;
        let radius_slot = match self.revision.move_layout {
            Some(MoveLayout::MinRadius) => p.world_radius_min,
            Some(MoveLayout::DistanceFromOrigin) => {
                FieldValue::from_u64(req.to_location.dist_from_origin + 1)
            }
            None => {
                return Err(CalldataShapeError::MissingMoveLayout {
                    kind: CircuitKind::Move,
                });
            }
        };

        Ok(vec![
            req.from_location.commitment.into(),
            req.to_location.commitment.into(),
            req.to_location.perlin.into(),
            radius_slot.into(),
            req.max_distance.into(),
            p.planethash_key.into(),
            p.spacetype_key.into(),
            p.perlin_length_scale.into(),
            req.population_moved.into(),
            req.silver_moved.into(),
            req.artifact_id.into(),
            u64::from(req.abandoning).into(),
        ])
    }

    fn whitelist(&self, req: &WhitelistRequest) -> Vec<CallValue> {
        vec![req.key_hash.into(), req.recipient.into()]
    }

    fn biomebase(&self, req: &BiomebaseRequest) -> Vec<CallValue> {
        let p = self.params;
        vec![
            req.location.commitment.into(),
            req.location.biomebase.into(),
            p.planethash_key.into(),
            p.biomebase_key.into(),
            p.perlin_length_scale.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Location;
    use crate::field::Coords;
    use crate::test_helpers::{PLANET_1_COORDS, game_params, planet_1, planet_2};

    fn proof() -> ProofBytes {
        ProofBytes::new(vec![0xab; 8])
    }

    fn uints(args: &CallArgs) -> Vec<u64> {
        args.inputs()
            .iter()
            .map(|v| v.as_uint().and_then(|f| f.to_u64()).unwrap_or(u64::MAX))
            .collect()
    }

    fn move_request() -> MoveRequest {
        MoveRequest {
            from: PLANET_1_COORDS,
            to: Coords::new(151, 997),
            from_location: planet_1(),
            to_location: Location {
                dist_from_origin: 41,
                ..planet_2()
            },
            max_distance: 1000,
            population_moved: 12,
            silver_moved: 34,
            artifact_id: FieldValue::from_u64(0x8c1a),
            abandoning: true,
        }
    }

    #[test]
    fn init_tuple_matches_verifier_layout() {
        let params = game_params();
        let revision = CircuitRevision::new(HexWidth::Word);
        let request = ActionRequest::Init(InitRequest {
            coords: PLANET_1_COORDS,
            location: planet_1(),
        });

        let args = CallArgumentAssembler::new(&params, &revision)
            .assemble(&request, proof())
            .unwrap();

        assert_eq!(args.entrypoint(), "initializePlayer");
        assert_eq!(args.inputs()[0], CallValue::Uint(planet_1().commitment));
        assert_eq!(uints(&args)[1..], [16, 1000, 7, 8, 4096]);
        assert_eq!(args.proof(), &proof());
    }

    #[test]
    fn reveal_carries_sign_slots() {
        let params = game_params();
        let revision = CircuitRevision::new(HexWidth::Word);
        let assembler = CallArgumentAssembler::new(&params, &revision);

        let args = assembler
            .assemble(
                &ActionRequest::Reveal(RevealRequest {
                    coords: PLANET_1_COORDS,
                    location: planet_1(),
                }),
                proof(),
            )
            .unwrap();
        assert_eq!(uints(&args)[1..], [16, 876, 0, 949, 0, 7, 8, 4096]);

        let negative = assembler
            .assemble(
                &ActionRequest::Reveal(RevealRequest {
                    coords: Coords::new(-5, 6),
                    location: planet_1(),
                }),
                proof(),
            )
            .unwrap();
        assert_eq!(uints(&negative)[2..6], [5, 1, 6, 0]);
    }

    #[test]
    fn move_layouts_are_pinned_per_revision() {
        let params = game_params();
        let request = ActionRequest::Move(move_request());

        let current = CircuitRevision::new(HexWidth::Word).with_move_layout(MoveLayout::MinRadius);
        let args = CallArgumentAssembler::new(&params, &current)
            .assemble(&request, proof())
            .unwrap();
        assert_eq!(args.inputs()[0], CallValue::Uint(planet_1().commitment));
        assert_eq!(args.inputs()[1], CallValue::Uint(planet_2().commitment));
        assert_eq!(
            uints(&args)[2..],
            [16, 1000, 1000, 7, 8, 4096, 12, 34, 0x8c1a, 1]
        );

        let earlier = CircuitRevision::new(HexWidth::Narrow)
            .with_move_layout(MoveLayout::DistanceFromOrigin);
        let args = CallArgumentAssembler::new(&params, &earlier)
            .assemble(&request, proof())
            .unwrap();
        assert_eq!(args.inputs().len(), 12);
        assert_eq!(uints(&args)[3], 42);
    }

    #[test]
    fn biomebase_tuple_matches_verifier_layout() {
        let params = game_params();
        let revision = CircuitRevision::new(HexWidth::Word);
        let request = ActionRequest::Biomebase(BiomebaseRequest {
            coords: PLANET_1_COORDS,
            location: Location {
                biomebase: 5,
                ..planet_1()
            },
        });

        let args = CallArgumentAssembler::new(&params, &revision)
            .assemble(&request, proof())
            .unwrap();

        assert_eq!(args.entrypoint(), "findArtifact");
        assert_eq!(args.inputs().len(), 5);
        assert_eq!(args.inputs()[0], CallValue::Uint(planet_1().commitment));
        assert_eq!(uints(&args)[1..], [5, 7, 9, 4096]);
        assert_eq!(args.proof(), &proof());
    }

    #[test]
    fn move_without_layout_is_rejected() {
        let params = game_params();
        let revision = CircuitRevision::new(HexWidth::Word);
        let err = CallArgumentAssembler::new(&params, &revision)
            .assemble(&ActionRequest::Move(move_request()), proof())
            .unwrap_err();
        assert_eq!(
            err,
            CalldataShapeError::MissingMoveLayout {
                kind: CircuitKind::Move
            }
        );
    }

    #[test]
    fn corrupted_key_hash_keeps_whitelist_shape() {
        let params = game_params();
        let revision = CircuitRevision::new(HexWidth::Word);
        let recipient: Address = "0x8950bab77f29e8f81e6f78aea0a79badd88eeb13".parse().unwrap();
        let request = ActionRequest::Whitelist(WhitelistRequest {
            key: FieldValue::from_u64(0xabc),
            key_hash: FieldValue::from_u64(0x1234),
            recipient,
        });

        let mut args = CallArgumentAssembler::new(&params, &revision)
            .assemble(&request, proof())
            .unwrap();
        let previous = args.replace_input(0, FieldValue::ZERO).unwrap();

        assert_eq!(previous, CallValue::Uint(FieldValue::from_u64(0x1234)));
        assert_eq!(args.inputs().len(), 2);
        assert_eq!(args.inputs()[0], CallValue::Uint(FieldValue::ZERO));
        assert_eq!(args.inputs()[1], CallValue::Address(recipient));
        assert!(matches!(
            args.replace_input(2, FieldValue::ZERO),
            Err(CalldataShapeError::SlotOutOfRange { index: 2, .. })
        ));
    }

    #[test]
    fn wrong_arity_is_a_shape_error() {
        let err = CallArgs::new(CircuitKind::Whitelist, vec![1u64.into()], proof()).unwrap_err();
        assert_eq!(
            err,
            CalldataShapeError::Arity {
                kind: CircuitKind::Whitelist,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn serializes_as_inputs_then_proof() {
        let args = CallArgs::new(
            CircuitKind::Whitelist,
            vec![
                FieldValue::from_u64(0x1234).into(),
                "0x8950bab77f29e8f81e6f78aea0a79badd88eeb13"
                    .parse::<Address>()
                    .unwrap()
                    .into(),
            ],
            ProofBytes::new(vec![1, 2]),
        )
        .unwrap();

        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                ["0x1234", "0x8950bab77f29e8f81e6f78aea0a79badd88eeb13"],
                "0x0102"
            ])
        );
    }
}
