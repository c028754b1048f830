//! Straight-line motion profiles
//!
//! A move from `a` to `b` is limited by whichever axis saturates first.
//! The per-axis limits are projected onto the line direction, then the
//! move is planned as either trapezoidal (accelerate, cruise, decelerate)
//! or triangular (never reaches the line speed limit).

use crate::error::{MotionError, MotionResult};
use crate::limits::{AxisLimits, ProfileOptions};
use pastekit_core::Point2D;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Moves shorter than this are treated as zero-length (mm)
pub const MIN_MOVE_LENGTH: f64 = 1e-9;

/// Upper bound on sampled waypoints for one move
pub const MAX_WAYPOINTS: usize = 1_000_000;

/// Velocity profile shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Trapezoidal,
    Triangular,
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Trapezoidal => write!(f, "trapezoidal"),
            ProfileKind::Triangular => write!(f, "triangular"),
        }
    }
}

/// A timed sample along the move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Path speed in mm/s
    pub speed: f64,
}

impl Waypoint {
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Speed in mm/min
    pub fn feed_rate(&self) -> f64 {
        self.speed * 60.0
    }
}

/// Planned profile for one XY move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Move length in mm
    pub lxy: f64,
    /// Line speed limit
    pub v_line: f64,
    /// Line acceleration limit
    pub a_line: f64,
    /// Highest speed actually reached
    pub v_peak: f64,
    pub kind: ProfileKind,
    pub t_accel: f64,
    pub t_cruise: f64,
    /// Total duration `T` in seconds
    pub total_time: f64,
    pub waypoints: Vec<Waypoint>,
}

impl MotionProfile {
    /// Distance covered at time `t`, clamped to `[0, lxy]`
    pub fn distance_at(&self, t: f64) -> f64 {
        self.phases().distance_at(t)
    }

    /// Path speed at time `t`
    pub fn speed_at(&self, t: f64) -> f64 {
        self.phases().speed_at(t)
    }

    fn phases(&self) -> Phases {
        Phases {
            length: self.lxy,
            accel: self.a_line,
            peak: self.v_peak,
            t_accel: self.t_accel,
            t_cruise: self.t_cruise,
            total: self.total_time,
        }
    }

    /// Sum of straight distances between consecutive waypoints
    pub fn sampled_length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].position().distance_to(&w[1].position()))
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Phases {
    length: f64,
    accel: f64,
    peak: f64,
    t_accel: f64,
    t_cruise: f64,
    total: f64,
}

impl Phases {
    fn d_accel(&self) -> f64 {
        0.5 * self.accel * self.t_accel * self.t_accel
    }

    fn distance_at(&self, t: f64) -> f64 {
        if self.total <= 0.0 || t >= self.total {
            return self.length;
        }
        if t <= 0.0 {
            return 0.0;
        }
        let s = if t < self.t_accel {
            0.5 * self.accel * t * t
        } else if t < self.t_accel + self.t_cruise {
            self.d_accel() + self.peak * (t - self.t_accel)
        } else {
            let remaining = self.total - t;
            self.length - 0.5 * self.accel * remaining * remaining
        };
        s.clamp(0.0, self.length)
    }

    fn speed_at(&self, t: f64) -> f64 {
        if self.total <= 0.0 || t <= 0.0 || t >= self.total {
            return 0.0;
        }
        if t < self.t_accel {
            self.accel * t
        } else if t < self.t_accel + self.t_cruise {
            self.peak
        } else {
            self.accel * (self.total - t)
        }
    }
}

fn line_limit(x_limit: f64, y_limit: f64, ux: f64, uy: f64) -> f64 {
    let along = |limit: f64, u: f64| {
        if u.abs() < f64::EPSILON {
            f64::INFINITY
        } else {
            limit / u.abs()
        }
    };
    along(x_limit, ux).min(along(y_limit, uy))
}

/// Plan and sample the move from `a` to `b`.
///
/// The last waypoint is always at `t = T`, exactly at `b`. A zero-length
/// move gives `T = 0` and a single waypoint.
pub fn profile(
    a: &Point2D,
    b: &Point2D,
    limits: &AxisLimits,
    options: &ProfileOptions,
) -> MotionResult<MotionProfile> {
    limits.validate()?;
    options.validate()?;

    let length = a.distance_to(b);
    if length < MIN_MOVE_LENGTH {
        return Ok(MotionProfile {
            lxy: length,
            v_line: limits.vx.min(limits.vy),
            a_line: limits.ax.min(limits.ay),
            v_peak: 0.0,
            kind: ProfileKind::Triangular,
            t_accel: 0.0,
            t_cruise: 0.0,
            total_time: 0.0,
            waypoints: vec![Waypoint {
                t: 0.0,
                x: b.x,
                y: b.y,
                z: options.z,
                speed: 0.0,
            }],
        });
    }

    let ux = (b.x - a.x) / length;
    let uy = (b.y - a.y) / length;
    let v_line = line_limit(limits.vx, limits.vy, ux, uy);
    let a_line = line_limit(limits.ax, limits.ay, ux, uy);

    let (kind, v_peak, t_accel, t_cruise) = if v_line * v_line / a_line > length {
        let t_accel = (length / a_line).sqrt();
        (ProfileKind::Triangular, (a_line * length).sqrt(), t_accel, 0.0)
    } else {
        let t_accel = v_line / a_line;
        let d_accel = v_line * v_line / (2.0 * a_line);
        let t_cruise = (length - 2.0 * d_accel) / v_line;
        (ProfileKind::Trapezoidal, v_line, t_accel, t_cruise)
    };
    let total_time = 2.0 * t_accel + t_cruise;

    let phases = Phases {
        length,
        accel: a_line,
        peak: v_peak,
        t_accel,
        t_cruise,
        total: total_time,
    };
    let sample = |t: f64| {
        let p = a.lerp(b, phases.distance_at(t) / length);
        Waypoint {
            t,
            x: p.x,
            y: p.y,
            z: options.z,
            speed: phases.speed_at(t),
        }
    };

    let samples = (total_time / options.time_step).ceil();
    if samples > MAX_WAYPOINTS as f64 {
        return Err(MotionError::InvalidLimits(format!(
            "{:.1} s move at {} s steps exceeds {} waypoints",
            total_time, options.time_step, MAX_WAYPOINTS
        )));
    }
    let steps = samples as usize;
    let mut waypoints: Vec<Waypoint> = (0..steps)
        .map(|k| k as f64 * options.time_step)
        .filter(|&t| t < total_time - 1e-12)
        .map(sample)
        .collect();
    waypoints.push(Waypoint {
        t: total_time,
        x: b.x,
        y: b.y,
        z: options.z,
        speed: 0.0,
    });

    debug!(
        "{} profile: {:.3} mm in {:.4} s, peak {:.2} mm/s, {} waypoints",
        kind,
        length,
        total_time,
        v_peak,
        waypoints.len()
    );

    Ok(MotionProfile {
        lxy: length,
        v_line,
        a_line,
        v_peak,
        kind,
        t_accel,
        t_cruise,
        total_time,
        waypoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_trapezoidal_along_x() {
        let limits = AxisLimits {
            vx: 50.0,
            ax: 500.0,
            ..AxisLimits::default()
        };
        let p = profile(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(100.0, 0.0),
            &limits,
            &ProfileOptions::default(),
        )
        .unwrap();

        assert_eq!(p.kind, ProfileKind::Trapezoidal);
        assert!(close(p.v_peak, 50.0, 1e-12));
        assert!(close(p.v_line * p.v_line / (2.0 * p.a_line), 2.5, 1e-12));
        assert!(close(p.t_accel, 0.1, 1e-12));
        assert!(close(p.t_cruise, 1.9, 1e-12));
        assert!(close(p.total_time, 2.1, 1e-12));

        let last = p.waypoints.last().unwrap();
        assert_eq!(last.t, p.total_time);
        assert_eq!((last.x, last.y), (100.0, 0.0));
        assert_eq!(p.waypoints[0].t, 0.0);
        assert!(p.waypoints.windows(2).all(|w| w[0].t < w[1].t));
    }

    #[test]
    fn test_triangular_short_move() {
        let limits = AxisLimits::planar(100.0, 100.0);
        let p = profile(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(0.0, 1.0),
            &limits,
            &ProfileOptions::default(),
        )
        .unwrap();
        assert_eq!(p.kind, ProfileKind::Triangular);
        assert!(close(p.v_peak, 10.0, 1e-12));
        assert!(close(p.t_accel, 0.1, 1e-12));
        assert_eq!(p.t_cruise, 0.0);
        assert!(close(p.distance_at(p.t_accel), 0.5, 1e-12));
    }

    #[test]
    fn test_diagonal_uses_tighter_axis() {
        let limits = AxisLimits {
            vx: 100.0,
            vy: 50.0,
            ax: 1000.0,
            ay: 1000.0,
            ..AxisLimits::default()
        };
        let p = profile(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(30.0, 40.0),
            &limits,
            &ProfileOptions::default(),
        )
        .unwrap();
        // uy = 0.8, so the Y axis caps the line speed at 62.5.
        assert!(close(p.v_line, 62.5, 1e-9));
        assert!(close(p.a_line, 1250.0, 1e-9));
    }

    #[test]
    fn test_zero_length_move() {
        let pt = Point2D::new(5.0, 5.0);
        let p = profile(&pt, &pt, &AxisLimits::default(), &ProfileOptions::at_height(1.5)).unwrap();
        assert_eq!(p.total_time, 0.0);
        assert_eq!(p.waypoints.len(), 1);
        assert_eq!(p.waypoints[0].z, 1.5);
    }

    #[test]
    fn test_invalid_limits() {
        let limits = AxisLimits {
            ax: -1.0,
            ..AxisLimits::default()
        };
        let result = profile(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(1.0, 0.0),
            &limits,
            &ProfileOptions::default(),
        );
        assert!(matches!(result, Err(MotionError::InvalidLimits(_))));
    }

    #[test]
    fn test_waypoint_count_is_bounded() {
        let limits = AxisLimits::planar(1e-6, 1000.0);
        let result = profile(
            &Point2D::new(0.0, 0.0),
            &Point2D::new(100.0, 0.0),
            &limits,
            &ProfileOptions::default(),
        );
        assert!(matches!(result, Err(MotionError::InvalidLimits(_))));

        // A slow move with a coarse step stays under the cap.
        let options = ProfileOptions {
            time_step: 1.0,
            ..ProfileOptions::default()
        };
        let limits = AxisLimits::planar(0.01, 1000.0);
        let p = profile(&Point2D::new(0.0, 0.0), &Point2D::new(100.0, 0.0), &limits, &options).unwrap();
        assert!(p.waypoints.len() <= MAX_WAYPOINTS + 1);
        assert_eq!(p.waypoints.last().map(|w| w.x), Some(100.0));
    }

    #[test]
    fn test_feed_rate() {
        let w = Waypoint {
            t: 0.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            speed: 25.0,
        };
        assert_eq!(w.feed_rate(), 1500.0);
    }
}
