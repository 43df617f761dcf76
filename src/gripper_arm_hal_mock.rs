use crate::gripper_arm_hal;
use crate::gripper_arm_hal::{GripperArmHal, VerticalArmPosition};

/// Encoder units travelled per full-speed forearm command.
pub const MOCK_ENCODER_STEP: f64 = 1.0;

#[derive(Debug)]
pub struct GripperArmHalMock {
    vertical: VerticalArmPosition,
    encoder: f64,
    forearm_speeds: Vec<f64>,
    vertical_commands: Vec<VerticalArmPosition>,
}

impl Default for GripperArmHalMock {
    fn default() -> Self {
        Self::new(VerticalArmPosition::Rear)
    }
}

impl GripperArmHalMock {
    pub fn new(initial_vertical: VerticalArmPosition) -> Self {
        Self {
            vertical: initial_vertical,
            encoder: 0.0,
            forearm_speeds: Vec::new(),
            vertical_commands: Vec::new(),
        }
    }

    pub fn set_vertical(&mut self, position: VerticalArmPosition) {
        self.vertical = position;
    }

    pub fn set_encoder(&mut self, distance: f64) {
        self.encoder = distance;
    }

    pub fn last_forearm_speed(&self) -> Option<f64> {
        self.forearm_speeds.last().copied()
    }

    pub fn forearm_speeds(&self) -> &[f64] {
        &self.forearm_speeds
    }

    pub fn vertical_commands(&self) -> &[VerticalArmPosition] {
        &self.vertical_commands
    }
}

impl GripperArmHal for GripperArmHalMock {
    fn current_vertical_position(&self) -> anyhow::Result<VerticalArmPosition> {
        Ok(self.vertical)
    }

    fn current_encoder_distance(&self) -> anyhow::Result<f64> {
        Ok(self.encoder)
    }

    fn send_vertical_command(&mut self, target: VerticalArmPosition) -> anyhow::Result<()> {
        println!("send_vertical_command: {target:?}");
        self.vertical_commands.push(target);
        // The bench double teleports; travel latency lives in the sim.
        self.vertical = target;
        Ok(())
    }

    fn send_forearm_speed(&mut self, speed: f64) -> anyhow::Result<()> {
        let speed = speed.clamp(
            -gripper_arm_hal::MAX_FOREARM_SPEED,
            gripper_arm_hal::MAX_FOREARM_SPEED,
        );
        println!("send_forearm_speed: {speed}");
        self.forearm_speeds.push(speed);
        self.encoder = (self.encoder + speed * MOCK_ENCODER_STEP).max(0.0);
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
        println!("{self:?}");
        Ok(())
    }
}
