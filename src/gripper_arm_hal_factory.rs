use crate::gripper_arm_hal::{GripperArmHal, VerticalArmPosition};
use crate::gripper_arm_hal_mock::GripperArmHalMock;
use crate::sim::gripper_arm_hal_sim::GripperArmHalSim;

#[derive(Default)]
pub struct GripperArmHalFactory {
    force_mock: bool,
    seed: Option<u64>,
    jitter: f64,
}

impl GripperArmHalFactory {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn new_maybe_mock(force_mock: bool) -> Self {
        Self {
            force_mock,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn create_hal(
        &self,
        initial_vertical: VerticalArmPosition,
    ) -> anyhow::Result<Box<dyn GripperArmHal>> {
        if self.force_mock {
            Ok(Box::new(GripperArmHalMock::new(initial_vertical)))
        } else {
            let sim = match self.seed {
                Some(seed) => GripperArmHalSim::with_seed(initial_vertical, seed),
                None => GripperArmHalSim::new(initial_vertical),
            };
            Ok(Box::new(sim.with_jitter(self.jitter)))
        }
    }
}
