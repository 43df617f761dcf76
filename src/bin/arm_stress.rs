//! Stress the positioning loop by cycling the arm between a target pose and
//! home, over and over:
//!
//! 1. Retract, swing the vertical stage, track onto the target angle
//! 2. Same thing back to the home pose
//!
//! This lets us watch convergence over many runs and catch drift or
//! oscillation regressions in the controller.

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use gripper_armbot::arm_position::ArmPosition;
use gripper_armbot::arm_positioner::ArmPositioner;
use gripper_armbot::command::{CommandRunner, RunOutcome};
use gripper_armbot::gripper_arm_hal::VerticalArmPosition;
use gripper_armbot::gripper_arm_hal_factory::GripperArmHalFactory;
use gripper_armbot::telemetry::MemoryTelemetry;
use gripper_armbot::tuning::ArmTuning;

const MAX_TICKS_PER_LEG: u64 = 3000;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<_> = env::args().collect();
    let num_runs_str = args.get(1).cloned().unwrap_or_else(|| "50".to_owned());
    let num_runs: u32 = num_runs_str.parse()?;
    let target_str = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "place_top".to_owned());
    let target: ArmPosition = target_str.parse()?;

    let tuning = ArmTuning::default();
    let mut hal = GripperArmHalFactory::new().create_hal(VerticalArmPosition::Rear)?;
    let runner = CommandRunner::new().with_max_ticks(MAX_TICKS_PER_LEG);
    let telemetry = Rc::new(RefCell::new(MemoryTelemetry::default()));

    for i in 0..num_runs {
        println!("Starting run #{i}...");
        for pose in [target, ArmPosition::Home] {
            let mut positioner = ArmPositioner::new(hal, pose, &tuning)
                .with_telemetry(Box::new(telemetry.clone()));
            match runner.run(&mut positioner)? {
                RunOutcome::Finished { ticks } => println!("  reached {pose:?} in {ticks} ticks"),
                RunOutcome::TimedOut { ticks } => {
                    positioner.into_hal().dump()?;
                    telemetry.borrow().dump();
                    anyhow::bail!("Gave up on {pose:?} after {ticks} ticks");
                }
            }
            hal = positioner.into_hal();
        }
    }
    telemetry.borrow().dump();
    println!("Successful stress test!");
    Ok(())
}
