//! Shared fixtures for unit tests: the two reference planets and a world
//! configuration.

use crate::action::{GameParams, Location};
use crate::field::{Coords, FieldValue};

pub const PLANET_1_COORDS: Coords = Coords::new(876, 949);

pub fn planet_1() -> Location {
    Location::new(
        "0x0000802bc4d6d6db6e2c80c476949ab73fdf9a1100d9bed50d4c24ab1e31d003"
            .parse()
            .unwrap(),
        16,
    )
}

pub fn planet_2() -> Location {
    Location::new(
        "0x0000ca8819a7378077cca9b7c4e2b3d2effebcefe88990a03379db75e0de5780"
            .parse()
            .unwrap(),
        16,
    )
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
