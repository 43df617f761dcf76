//! Closed-loop positioning of the two-stage arm: home the vertical stage,
//! then servo the forearm encoder onto the pose angle.

use log::debug;

use crate::arm_position::ArmPosition;
use crate::command::Command;
use crate::gripper_arm_hal::GripperArmHal;
use crate::regulator::SpeedRegulator;
use crate::telemetry::{NullTelemetry, TelemetrySink};
use crate::tuning::ArmTuning;

/// One instance per goal. Owns the HAL while the goal is pursued and hands it
/// back through into_hal(); nothing else may command the arm in between.
pub struct ArmPositioner {
    hal: Box<dyn GripperArmHal>,
    telemetry: Box<dyn TelemetrySink>,
    desired: ArmPosition,
    homing_speed: f64,
    regulator: SpeedRegulator,
    phase: Phase,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Phase {
    /// Vertical stage not yet at the desired position: retract the forearm
    /// and pivot the stage once the forearm is inside the safe zone.
    Homing,
    /// Vertical stage in position: closed-loop drive toward the pose angle.
    Tracking,
}

impl ArmPositioner {
    pub fn new(hal: Box<dyn GripperArmHal>, desired: ArmPosition, tuning: &ArmTuning) -> Self {
        Self {
            hal,
            telemetry: Box::new(NullTelemetry),
            desired,
            homing_speed: tuning.homing_speed,
            regulator: SpeedRegulator::new(tuning, desired.encoder_angle()),
            phase: Phase::Homing,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn desired(&self) -> ArmPosition {
        self.desired
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn into_hal(self) -> Box<dyn GripperArmHal> {
        self.hal
    }

    fn vertical_in_position(&self) -> anyhow::Result<bool> {
        Ok(self.hal.current_vertical_position()? == self.desired.vertical_position())
    }
}

impl Command for ArmPositioner {
    fn tick(&mut self) -> anyhow::Result<()> {
        let vertical_in_position = self.vertical_in_position()?;
        let speed = if vertical_in_position {
            self.phase = Phase::Tracking;
            self.regulator.compute(self.hal.current_encoder_distance()?)
        } else {
            if self.phase == Phase::Tracking {
                debug!("Vertical stage left {:?} position, homing again", self.desired.vertical_position());
            }
            self.phase = Phase::Homing;
            let target = self.desired.vertical_position();
            // Only pivot the stage once the forearm has retracted clear of
            // its travel arc; re-checked every tick from the live reading.
            if self.hal.current_encoder_distance()? < self.hal.min_encoder_threshold(target) {
                self.hal.send_vertical_command(target)?;
            }
            self.homing_speed
        };

        self.telemetry.put_number("arm/speed", speed);
        self.telemetry.put_number("arm/setpoint", self.regulator.setpoint());
        self.telemetry.put_flag("arm/at_setpoint", self.regulator.at_setpoint());
        self.telemetry.put_flag("arm/vertical_in_position", vertical_in_position);

        self.hal.send_forearm_speed(speed)
    }

    fn is_finished(&self) -> anyhow::Result<bool> {
        Ok(self.phase == Phase::Tracking
            && self.regulator.at_setpoint()
            && self.vertical_in_position()?)
    }
}
