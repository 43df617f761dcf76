pub mod arm_bt;
pub mod arm_position;
pub mod arm_positioner;
pub mod command;
pub mod gripper_arm_hal;
pub mod gripper_arm_hal_factory;
pub mod gripper_arm_hal_mock;
pub mod regulator;
pub mod sim;
pub mod telemetry;
pub mod tuning;
