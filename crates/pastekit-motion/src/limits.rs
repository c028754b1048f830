use crate::error::{MotionError, MotionResult};
use serde::{Deserialize, Serialize};

/// Per-axis kinematic limits (mm/s, mm/s²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLimits {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

impl Default for AxisLimits {
    fn default() -> Self {
        Self {
            vx: 100.0,
            vy: 100.0,
            vz: 20.0,
            ax: 1000.0,
            ay: 1000.0,
            az: 200.0,
        }
    }
}

impl AxisLimits {
    /// Same limits on X and Y, Z left at its default
    pub fn planar(v: f64, a: f64) -> Self {
        Self {
            vx: v,
            vy: v,
            ax: a,
            ay: a,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> MotionResult<()> {
        for (name, value) in [
            ("vx", self.vx),
            ("vy", self.vy),
            ("vz", self.vz),
            ("ax", self.ax),
            ("ay", self.ay),
            ("az", self.az),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(MotionError::InvalidLimits(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Waypoint sampling options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// Sampling interval in seconds
    pub time_step: f64,
    /// Constant Z for every waypoint of the move
    pub z: f64,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            z: 0.0,
        }
    }
}

impl ProfileOptions {
    pub fn at_height(z: f64) -> Self {
        Self {
            z,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> MotionResult<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(MotionError::InvalidLimits(format!(
                "time step must be > 0, got {}",
                self.time_step
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_valid() {
        assert!(AxisLimits::default().validate().is_ok());
        assert!(ProfileOptions::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_limits() {
        let limits = AxisLimits {
            ay: 0.0,
            ..AxisLimits::default()
        };
        let err = limits.validate().unwrap_err();
        assert!(err.to_string().contains("ay"));

        let limits = AxisLimits {
            vx: f64::INFINITY,
            ..AxisLimits::default()
        };
        assert!(limits.validate().is_err());

        let options = ProfileOptions {
            time_step: -0.1,
            z: 0.0,
        };
        assert!(options.validate().is_err());
    }
}
