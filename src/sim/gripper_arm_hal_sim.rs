use std::cell::RefCell;

use conv::{ConvUtil, RoundToNearest};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gripper_arm_hal;
use crate::gripper_arm_hal::{GripperArmHal, VerticalArmPosition};

/// Encoder units per second at full forearm speed.
const FOREARM_FULL_SPEED: f64 = 25.0;
const TICK_PERIOD_S: f64 = 0.02;
/// Ticks between a pivot command and the stage reporting the new position.
const VERTICAL_TRAVEL_TICKS: u32 = 10;
const ENCODER_MIN: f64 = 0.0;
const ENCODER_MAX: f64 = 40.0;

/// Kinematic stand-in for the real arm. Plant time advances one control
/// period per forearm command, which the controller issues exactly once per
/// tick.
#[derive(Debug)]
pub struct GripperArmHalSim {
    vertical: VerticalArmPosition,
    pending_vertical: Option<PendingMove>,
    encoder: f64,
    jitter: f64,
    rng: RefCell<StdRng>,
}

#[derive(Debug)]
struct PendingMove {
    target: VerticalArmPosition,
    ticks_left: u32,
}

impl GripperArmHalSim {
    pub fn new(initial_vertical: VerticalArmPosition) -> Self {
        Self::with_seed(initial_vertical, 0)
    }

    pub fn with_seed(initial_vertical: VerticalArmPosition, seed: u64) -> Self {
        Self {
            vertical: initial_vertical,
            pending_vertical: None,
            encoder: ENCODER_MIN,
            jitter: 0.0,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform noise added to every encoder reading. Keep it well under the
    /// regulator tolerance or nothing will ever finish.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    fn advance(&mut self, speed: f64) {
        self.encoder = (self.encoder + speed * FOREARM_FULL_SPEED * TICK_PERIOD_S)
            .clamp(ENCODER_MIN, ENCODER_MAX);
        if let Some(pending) = &mut self.pending_vertical {
            pending.ticks_left -= 1;
            if pending.ticks_left == 0 {
                debug!("Vertical stage arrived at {:?}", pending.target);
                self.vertical = pending.target;
                self.pending_vertical = None;
            }
        }
    }
}

impl GripperArmHal for GripperArmHalSim {
    fn current_vertical_position(&self) -> anyhow::Result<VerticalArmPosition> {
        Ok(self.vertical)
    }

    fn current_encoder_distance(&self) -> anyhow::Result<f64> {
        let mut reading = self.encoder;
        if self.jitter > 0.0 {
            reading += self.rng.borrow_mut().gen_range(-self.jitter..=self.jitter);
        }
        Ok(reading)
    }

    fn send_vertical_command(&mut self, target: VerticalArmPosition) -> anyhow::Result<()> {
        if self.vertical == target {
            self.pending_vertical = None;
            return Ok(());
        }
        match &self.pending_vertical {
            // Re-issuing the same request must not restart the travel.
            Some(pending) if pending.target == target => {}
            _ => {
                trace!("send_vertical_command: {target:?}");
                self.pending_vertical = Some(PendingMove {
                    target,
                    ticks_left: VERTICAL_TRAVEL_TICKS,
                });
            }
        }
        Ok(())
    }

    fn send_forearm_speed(&mut self, speed: f64) -> anyhow::Result<()> {
        let speed = speed.clamp(
            -gripper_arm_hal::MAX_FOREARM_SPEED,
            gripper_arm_hal::MAX_FOREARM_SPEED,
        );
        let duty_cycle = (speed * 100.0)
            .approx_as_by::<i32, RoundToNearest>()
            .unwrap();
        trace!("send_forearm_speed: {speed} (duty {duty_cycle}%)");
        self.advance(speed);
        Ok(())
    }

    fn min_encoder_threshold(&self, target: VerticalArmPosition) -> f64 {
        match target {
            VerticalArmPosition::Rear => gripper_arm_hal::MIN_ENCODER_REAR,
            VerticalArmPosition::Forward => gripper_arm_hal::MIN_ENCODER_FORWARD,
            VerticalArmPosition::Centre => gripper_arm_hal::MIN_ENCODER_CENTRE,
        }
    }

    fn dump(&self) -> anyhow::Result<()> {
        debug!("{self:?}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forearm_integrates_and_clamps_travel() {
        let mut sim = GripperArmHalSim::new(VerticalArmPosition::Rear);
        sim.send_forearm_speed(1.0).unwrap();
        let step = FOREARM_FULL_SPEED * TICK_PERIOD_S;
        assert!((sim.current_encoder_distance().unwrap() - step).abs() < 1e-9);

        // Hard stop at the bottom of travel.
        sim.send_forearm_speed(-1.0).unwrap();
        sim.send_forearm_speed(-1.0).unwrap();
        assert_eq!(sim.current_encoder_distance().unwrap(), ENCODER_MIN);

        // And at the top.
        for _ in 0..100 {
            sim.send_forearm_speed(1.0).unwrap();
        }
        assert_eq!(sim.current_encoder_distance().unwrap(), ENCODER_MAX);
    }

    #[test]
    fn test_vertical_travel_takes_time_and_reissue_is_idempotent() {
        let mut sim = GripperArmHalSim::new(VerticalArmPosition::Rear);
        sim.send_vertical_command(VerticalArmPosition::Forward).unwrap();
        for _ in 0..(VERTICAL_TRAVEL_TICKS - 1) {
            // Spamming the same request every tick, like the homing loop does.
            sim.send_vertical_command(VerticalArmPosition::Forward).unwrap();
            sim.send_forearm_speed(0.0).unwrap();
            assert_eq!(
                sim.current_vertical_position().unwrap(),
                VerticalArmPosition::Rear
            );
        }
        sim.send_forearm_speed(0.0).unwrap();
        assert_eq!(
            sim.current_vertical_position().unwrap(),
            VerticalArmPosition::Forward
        );
    }

    #[test]
    fn test_command_back_to_current_position_cancels_travel() {
        let mut sim = GripperArmHalSim::new(VerticalArmPosition::Rear);
        sim.send_vertical_command(VerticalArmPosition::Centre).unwrap();
        sim.send_vertical_command(VerticalArmPosition::Rear).unwrap();
        for _ in 0..20 {
            sim.send_forearm_speed(0.0).unwrap();
        }
        assert_eq!(
            sim.current_vertical_position().unwrap(),
            VerticalArmPosition::Rear
        );
    }

    #[test]
    fn test_jitter_stays_bounded() {
        let mut sim =
            GripperArmHalSim::with_seed(VerticalArmPosition::Rear, 42).with_jitter(0.05);
        for _ in 0..4 {
            sim.send_forearm_speed(1.0).unwrap();
        }
        let truth = 4.0 * FOREARM_FULL_SPEED * TICK_PERIOD_S;
        for _ in 0..50 {
            let reading = sim.current_encoder_distance().unwrap();
            assert!((reading - truth).abs() <= 0.05 + 1e-9, "reading {reading}");
        }
    }
}
