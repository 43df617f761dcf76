use std::rc::Rc;
use std::time::Duration;

use ai_behavior::{Action, Behavior, Failure, Running, Sequence, Status, Success, Wait, While};
use log::{error, info};

use crate::arm_position::ArmPosition;
use crate::arm_positioner::ArmPositioner;
use crate::command::Command;
use crate::gripper_arm_hal::GripperArmHal;
use crate::telemetry::LogTelemetry;
use crate::tuning::ArmTuning;

pub const LEG_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ArmBehaviourTreeFactory {
    leg_timeout: Duration,
}

impl ArmBehaviourTreeFactory {
    pub fn new() -> Self {
        Self {
            leg_timeout: LEG_TIMEOUT,
        }
    }

    pub fn with_leg_timeout(mut self, period: Duration) -> Self {
        self.leg_timeout = period;
        self
    }

    /// One leg per waypoint, in order; a leg that overruns its timeout fails
    /// the whole mission.
    pub fn create_mission_bt(&self, waypoints: &[ArmPosition]) -> Behavior<ArmAction> {
        let legs = waypoints
            .iter()
            .map(|&pose| self.WithTimeout(self.leg_timeout, self.PositionArm(pose)))
            .collect();
        Sequence(legs)
    }

    #[allow(non_snake_case)]
    fn PositionArm(&self, pose: ArmPosition) -> Behavior<ArmAction> {
        Action(ArmAction::new(move |s: &mut ArmMissionState| {
            s.tick_leg(pose)
        }))
    }

    #[allow(non_snake_case)]
    fn WithTimeout(&self, period: Duration, action: Behavior<ArmAction>) -> Behavior<ArmAction> {
        // The timer runs as the monitor sequence; when it reaches give_up the
        // wrapper fails, dropping the wrapped behaviour mid-flight.
        let give_up = Action(ArmAction::new(|_: &mut ArmMissionState| Failure));
        While(Box::new(action), vec![Wait(period.as_secs_f64()), give_up])
    }
}

impl Default for ArmBehaviourTreeFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ArmAction {
    pub action: Rc<dyn ActionFn>,
}

pub trait ActionFn {
    fn handle(&self, state: &mut ArmMissionState) -> Status;
}

impl<F> ActionFn for F
where
    F: Fn(&mut ArmMissionState) -> Status,
{
    fn handle(&self, state: &mut ArmMissionState) -> Status {
        (self)(state)
    }
}

impl ArmAction {
    pub fn new(action: impl ActionFn + 'static) -> Self {
        Self {
            action: Rc::new(action),
        }
    }
}

/// Owns the HAL between legs and lends it to one [ArmPositioner] at a time.
pub struct ArmMissionState {
    hal: Option<Box<dyn GripperArmHal>>,
    active: Option<ArmPositioner>,
    tuning: ArmTuning,
    completed_legs: usize,
}

impl ArmMissionState {
    pub fn new(hal: Box<dyn GripperArmHal>, tuning: ArmTuning) -> Self {
        Self {
            hal: Some(hal),
            active: None,
            tuning,
            completed_legs: 0,
        }
    }

    pub fn completed_legs(&self) -> usize {
        self.completed_legs
    }

    pub fn into_hal(mut self) -> Box<dyn GripperArmHal> {
        self.finish_leg(true);
        self.hal.take().unwrap()
    }

    pub fn tick_leg(&mut self, pose: ArmPosition) -> Status {
        if self.active.as_ref().map(|leg| leg.desired()) != Some(pose) {
            if !self.begin_leg(pose) {
                return Failure;
            }
        }

        let leg = self.active.as_mut().unwrap();
        if let Err(e) = leg.tick() {
            error!("Tick failed moving to {pose:?}: {e:?}");
            return Failure;
        }
        match leg.is_finished() {
            Ok(true) => {
                self.finish_leg(false);
                Success
            }
            Ok(false) => Running,
            Err(e) => {
                error!("Lost track of progress moving to {pose:?}: {e:?}");
                Failure
            }
        }
    }

    fn begin_leg(&mut self, pose: ArmPosition) -> bool {
        // A timed out leg can still be holding the HAL when the next one starts.
        self.finish_leg(true);
        let hal = self.hal.take().unwrap();
        info!("Moving arm to {pose:?}...");
        let mut leg =
            ArmPositioner::new(hal, pose, &self.tuning).with_telemetry(Box::new(LogTelemetry));
        if let Err(e) = leg.on_start() {
            error!("Failed to start leg for {pose:?}: {e:?}");
            self.hal = Some(leg.into_hal());
            return false;
        }
        self.active = Some(leg);
        true
    }

    fn finish_leg(&mut self, interrupted: bool) {
        if let Some(mut leg) = self.active.take() {
            let _ = leg.on_end(interrupted);
            if interrupted {
                info!("Interrupted leg for {:?}", leg.desired());
            } else {
                self.completed_legs += 1;
                info!("Arm reached {:?} ({} legs done)", leg.desired(), self.completed_legs);
            }
            self.hal = Some(leg.into_hal());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use ai_behavior::State;
    use input::{Event, UpdateArgs};

    use super::*;
    use crate::gripper_arm_hal::VerticalArmPosition;
    use crate::sim::gripper_arm_hal_sim::GripperArmHalSim;

    fn run_bt(
        bt: Behavior<ArmAction>,
        state: &mut ArmMissionState,
        max_ticks: u32,
    ) -> Status {
        let mut machine: State<ArmAction, ()> = State::new(bt);
        let mut status = Running;
        for _ in 0..max_ticks {
            let e: Event = UpdateArgs { dt: 0.02 }.into();
            let (after, _) = machine.event(&e, &mut |args| {
                (args.action.action.handle(state), args.dt)
            });
            status = after;
            if status != Running {
                break;
            }
        }
        status
    }

    #[test]
    fn test_mission_visits_waypoints_in_order() {
        let sim = Rc::new(RefCell::new(GripperArmHalSim::new(
            VerticalArmPosition::Rear,
        )));
        let bt = ArmBehaviourTreeFactory::new()
            .create_mission_bt(&[ArmPosition::PickFloor, ArmPosition::PlaceTop]);
        let mut state = ArmMissionState::new(Box::new(sim.clone()), ArmTuning::default());

        let status = run_bt(bt, &mut state, 2000);

        assert!(matches!(status, Success));
        assert_eq!(state.completed_legs(), 2);
        assert_eq!(
            sim.borrow().current_vertical_position().unwrap(),
            VerticalArmPosition::Forward
        );
        let final_distance = sim.borrow().current_encoder_distance().unwrap();
        assert!(
            (final_distance - ArmPosition::PlaceTop.encoder_angle()).abs() < 0.5,
            "stopped at {final_distance}"
        );

        // The HAL comes back out once the mission is over.
        let hal = state.into_hal();
        assert_eq!(
            hal.current_vertical_position().unwrap(),
            VerticalArmPosition::Forward
        );
    }

    #[test]
    fn test_leg_timeout_fails_mission() {
        let sim = Rc::new(RefCell::new(GripperArmHalSim::new(
            VerticalArmPosition::Rear,
        )));
        // Three update events is nowhere near enough to finish the vertical swing.
        let bt = ArmBehaviourTreeFactory::new()
            .with_leg_timeout(Duration::from_millis(60))
            .create_mission_bt(&[ArmPosition::PlaceTop]);
        let mut state = ArmMissionState::new(Box::new(sim.clone()), ArmTuning::default());

        let status = run_bt(bt, &mut state, 100);

        assert!(matches!(status, Failure));
        assert_eq!(state.completed_legs(), 0);

        // The interrupted leg must still hand the HAL back intact.
        let hal = state.into_hal();
        assert_eq!(hal.current_encoder_distance().unwrap(), 0.0);
    }

    #[test]
    fn test_repeated_pose_runs_as_separate_legs() {
        let sim = Rc::new(RefCell::new(GripperArmHalSim::new(
            VerticalArmPosition::Rear,
        )));
        let bt = ArmBehaviourTreeFactory::new()
            .create_mission_bt(&[ArmPosition::Home, ArmPosition::Home]);
        let mut state = ArmMissionState::new(Box::new(sim.clone()), ArmTuning::default());

        let status = run_bt(bt, &mut state, 100);

        assert!(matches!(status, Success));
        assert_eq!(state.completed_legs(), 2);
    }
}
