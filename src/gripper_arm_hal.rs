use std::cell::RefCell;
use std::rc::Rc;

pub const MAX_FOREARM_SPEED: f64 = 1.0;
pub const MIN_ENCODER_REAR: f64 = 5.0;
pub const MIN_ENCODER_FORWARD: f64 = 5.0;
pub const MIN_ENCODER_CENTRE: f64 = 7.5;

pub trait GripperArmHal {
    fn current_vertical_position(&self) -> anyhow::Result<VerticalArmPosition>;
    fn current_encoder_distance(&self) -> anyhow::Result<f64>;
    fn send_vertical_command(&mut self, target: VerticalArmPosition) -> anyhow::Result<()>;
    fn send_forearm_speed(&mut self, speed: f64) -> anyhow::Result<()>;
    /// Encoder reading below which the vertical stage can pivot without the
    /// forearm fouling its travel arc.
    fn min_encoder_threshold(&self, target: VerticalArmPosition) -> f64;
    fn dump(&self) -> anyhow::Result<()>;
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum VerticalArmPosition {
    Rear,
    Forward,
    Centre,
}

// Lets a caller keep a handle on a HAL it has already boxed away, which the
// tests lean on heavily.
impl<T: GripperArmHal> GripperArmHal for Rc<RefCell<T>> {
    fn current_vertical_position(&self) -> anyhow::Result<VerticalArmPosition> {
        self.borrow().current_vertical_position()
    }

    fn current_encoder_distance(&self) -> anyhow::Result<f64> {
        self.borrow().current_encoder_distance()
    }

    fn send_vertical_command(&mut self, target: VerticalArmPosition) -> anyhow::Result<()> {
        self.borrow_mut().send_vertical_command(target)
    }

    fn send_forearm_speed(&mut self, speed: f64) -> anyhow::Result<()> {
        self.borrow_mut().send_forearm_speed(speed)
    }

    fn min_encoder_threshold(&self, target: VerticalArmPosition) -> f64 {
        self.borrow().min_encoder_threshold(target)
    }

    fn dump(&self) -> anyhow::Result<()> {
        self.borrow().dump()
    }
}
