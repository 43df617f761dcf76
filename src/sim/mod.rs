pub mod gripper_arm_hal_sim;
