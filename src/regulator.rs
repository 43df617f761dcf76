use pid::Pid;

use crate::tuning::ArmTuning;

/// Closed-loop speed regulator for the forearm: PID with symmetric output
/// clamping, plus the at-setpoint bookkeeping the pid crate does not carry.
pub struct SpeedRegulator {
    pid: Pid<f64>,
    setpoint: f64,
    tolerance: f64,
    last_error: Option<f64>,
}

impl SpeedRegulator {
    pub fn new(tuning: &ArmTuning, setpoint: f64) -> Self {
        // Every limit sits at the commanded-speed clamp, so windup cannot
        // carry any term past the output range.
        let limit = tuning.max_pid_speed;
        let pid = Pid::new(
            tuning.kp,
            tuning.ki,
            tuning.kd,
            limit,
            limit,
            limit,
            limit,
            setpoint,
        );
        Self {
            pid,
            setpoint,
            tolerance: tuning.setpoint_tolerance,
            last_error: None,
        }
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Commanded speed for the given encoder reading, already clamped.
    pub fn compute(&mut self, measured: f64) -> f64 {
        self.last_error = Some(self.setpoint - measured);
        self.pid.next_control_output(measured).output
    }

    /// False until the first compute(). Strictly-below comparison: an error
    /// exactly at the tolerance is still out.
    pub fn at_setpoint(&self) -> bool {
        matches!(self.last_error, Some(error) if error.abs() < self.tolerance)
    }

    pub fn reset(&mut self) {
        self.pid.reset_integral_term();
        self.last_error = None;
    }
}
