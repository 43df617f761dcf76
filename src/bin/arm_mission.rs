//! Drive the gripper arm through a list of named waypoints, in order:
//!
//! ```text
//! arm_mission pick_floor place_top home
//! ```
//!
//! Each waypoint becomes one closed-loop positioning leg (retract, swing the
//! vertical stage if needed, then track the forearm onto the target angle).
//! Runs against the simulated arm by default; pass `--fake-hw` for the canned
//! bench double.

use std::{io, thread};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ai_behavior::{Behavior, State, Status};
use anyhow::anyhow;
use clap::Parser;
use input::{Event, UpdateArgs};

use gripper_armbot::arm_bt::{ArmAction, ArmBehaviourTreeFactory, ArmMissionState};
use gripper_armbot::arm_position::ArmPosition;
use gripper_armbot::command::TICK_INTERVAL;
use gripper_armbot::gripper_arm_hal::{GripperArmHal, VerticalArmPosition};
use gripper_armbot::gripper_arm_hal_factory::GripperArmHalFactory;
use gripper_armbot::tuning::ArmTuning;

#[derive(Parser, Debug)]
#[clap(name = "arm_mission")]
struct Opts {
    /// Waypoints to visit: home, pick_floor, pick_station, place_top, place_mid.
    #[clap(required = true)]
    waypoints: Vec<ArmPosition>,

    #[clap(long)]
    fake_hw: bool,

    /// Fix the simulated sensor noise sequence.
    #[clap(long)]
    seed: Option<u64>,

    /// Uniform encoder/read jitter amplitude for the simulated arm.
    #[clap(long, default_value = "0.0")]
    jitter: f64,

    /// JSON file overriding the built-in controller gains.
    #[clap(long)]
    tuning: Option<PathBuf>,

    /// Per-leg timeout in seconds before the mission is abandoned.
    #[clap(long, default_value = "10")]
    leg_timeout: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let tuning = match &opts.tuning {
        Some(path) => ArmTuning::load(path)?,
        None => ArmTuning::default(),
    };
    let hal = GripperArmHalFactory::new_maybe_mock(opts.fake_hw)
        .with_seed(opts.seed)
        .with_jitter(opts.jitter)
        .create_hal(VerticalArmPosition::Rear)?;
    let bt = ArmBehaviourTreeFactory::new()
        .with_leg_timeout(Duration::from_secs(opts.leg_timeout))
        .create_mission_bt(&opts.waypoints);

    println!("Planned {} legs, let's do this...", opts.waypoints.len());
    run_machine(bt, hal, tuning)?;
    println!("Mission complete!");
    Ok(())
}

fn run_machine(
    behaviour: Behavior<ArmAction>,
    hal: Box<dyn GripperArmHal>,
    tuning: ArmTuning,
) -> anyhow::Result<Box<dyn GripperArmHal>> {
    let mut machine: State<ArmAction, ()> = State::new(behaviour);
    let mut state = ArmMissionState::new(hal, tuning);

    let mut dt = 0.0;
    let mut ticks = 0;
    let result = loop {
        let start = Instant::now();
        let e: Event = UpdateArgs { dt }.into();
        let (status, _) = machine.event(&e, &mut |args| {
            (args.action.action.handle(&mut state), args.dt)
        });

        // TODO: This of course should be a proper RT interval!
        thread::sleep(TICK_INTERVAL);
        dt = start.elapsed().as_secs_f64();
        ticks += 1;

        match status {
            Status::Success => break Ok(()),
            Status::Failure => {
                let legs = state.completed_legs();
                break Err(anyhow!("Mission failed after {legs} completed legs!"));
            }
            Status::Running => {
                // Print that a tick happened but keep going...
                if ticks % 60 != 0 {
                    print!(".");
                    io::stdout().flush()?;
                } else {
                    println!();
                }
            }
        }
    };
    println!();

    match result {
        Ok(()) => Ok(state.into_hal()),
        Err(e) => {
            // Leave a post-mortem of where the arm ended up.
            state.into_hal().dump()?;
            Err(e)
        }
    }
}
