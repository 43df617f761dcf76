use std::str::FromStr;

use thiserror::Error;

use crate::gripper_arm_hal::VerticalArmPosition;

/// Named arm poses: a forearm encoder angle paired with the discrete vertical
/// stage position that must be reached first. The table is fixed at compile
/// time.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ArmPosition {
    Home,
    PickFloor,
    PickStation,
    PlaceTop,
    PlaceMid,
}

impl ArmPosition {
    pub const ALL: [ArmPosition; 5] = [
        ArmPosition::Home,
        ArmPosition::PickFloor,
        ArmPosition::PickStation,
        ArmPosition::PlaceTop,
        ArmPosition::PlaceMid,
    ];

    pub fn encoder_angle(self) -> f64 {
        match self {
            ArmPosition::Home => 0.0,
            ArmPosition::PickFloor => 3.25,
            ArmPosition::PickStation => 15.0,
            ArmPosition::PlaceTop => 31.5,
            ArmPosition::PlaceMid => 18.5,
        }
    }

    pub fn vertical_position(self) -> VerticalArmPosition {
        match self {
            ArmPosition::Home => VerticalArmPosition::Rear,
            ArmPosition::PickFloor => VerticalArmPosition::Forward,
            ArmPosition::PickStation => VerticalArmPosition::Rear,
            ArmPosition::PlaceTop => VerticalArmPosition::Forward,
            ArmPosition::PlaceMid => VerticalArmPosition::Centre,
        }
    }
}

impl FromStr for ArmPosition {
    type Err = UnknownArmPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(ArmPosition::Home),
            "pick_floor" => Ok(ArmPosition::PickFloor),
            "pick_station" => Ok(ArmPosition::PickStation),
            "place_top" => Ok(ArmPosition::PlaceTop),
            "place_mid" => Ok(ArmPosition::PlaceMid),
            other => Err(UnknownArmPosition(other.to_owned())),
        }
    }
}

#[derive(Error, Debug)]
#[error("unknown arm position '{0}'")]
pub struct UnknownArmPosition(String);
