use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Field-tunable controller parameters, passed in explicitly rather than read
/// live from a dashboard table. A JSON file can override any subset.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ArmTuning {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Symmetric clamp on the tracking output.
    pub max_pid_speed: f64,
    /// Error magnitude below which the regulator reports at-setpoint.
    pub setpoint_tolerance: f64,
    /// Fixed forearm speed while the vertical stage is out of position.
    pub homing_speed: f64,
}

impl Default for ArmTuning {
    fn default() -> Self {
        Self {
            kp: 0.5,
            ki: 0.0,
            kd: 0.0,
            max_pid_speed: 0.8,
            setpoint_tolerance: 0.5,
            homing_speed: -1.0,
        }
    }
}

impl ArmTuning {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningLoadError> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }
}

#[derive(Error, Debug)]
pub enum TuningLoadError {
    #[error("tuning file unreadable: {0}")]
    Io(#[from] std::io::Error),
    #[error("tuning file malformed: {0}")]
    Parse(#[from] serde_json::Error),
}
