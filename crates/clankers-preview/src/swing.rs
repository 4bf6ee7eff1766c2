//! Swing foot trajectory generator.
//!
//! A swinging foot travels from its liftoff position to its target foothold
//! over the phase, lifting to `step_height` above the straight line between
//! them.
//!
//! Uses 12-point (degree-11) Bezier curves (MIT Cheetah style) for both
//! horizontal interpolation and height profile. The control points are arranged
//! to guarantee zero velocity and acceleration at liftoff (t=0) and
//! touchdown (t=1).

use nalgebra::Vector3;

// 12-point Bezier for horizontal interpolation (S-curve from 0 to 1).
// First 3 and last 3 control points are equal → zero velocity and acceleration
// at both endpoints.
const BEZIER_S: [f64; 12] = [
    0.0, 0.0, 0.0, // zero vel/accel at start
    0.5, 0.5, // transition
    0.5, 0.5, // midpoint plateau
    0.5, 0.5, // transition
    1.0, 1.0, 1.0, // zero vel/accel at end
];

// 12-point Bezier for height profile (peaks at t=0.5).
// First 3 and last 3 are 0 → zero height + zero vel/accel at endpoints.
// Multiplied by step_height / BEZIER_H_PEAK at evaluation time so the actual
// peak equals step_height.
const BEZIER_H: [f64; 12] = [
    0.0, 0.0, 0.0, // zero at liftoff
    0.9, 0.9, // rise
    1.0, 1.0, // peak
    0.9, 0.9, // descent
    0.0, 0.0, 0.0, // zero at touchdown
];

// Peak value of bezier_eval(&BEZIER_H, 0.5).
const BEZIER_H_PEAK: f64 = 0.886_230_468_750;

/// Evaluate a Bezier curve with `N` control points at `t` (De Casteljau).
fn de_casteljau<const N: usize>(mut work: [f64; N], t: f64) -> f64 {
    for k in 1..N {
        for i in 0..(N - k) {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
    }
    work[0]
}

/// Evaluate a degree-11 Bezier curve at parameter `t`.
fn bezier_eval(points: &[f64; 12], t: f64) -> f64 {
    de_casteljau(*points, t)
}

/// First derivative of a degree-11 Bezier curve at parameter `t`.
///
/// Uses the hodograph property: B'(t) = 11 * degree-10 Bezier on the forward
/// differences of control points.
fn bezier_derivative(points: &[f64; 12], t: f64) -> f64 {
    let mut diffs = [0.0; 11];
    for i in 0..11 {
        diffs[i] = points[i + 1] - points[i];
    }
    11.0 * de_casteljau(diffs, t)
}

/// Second derivative of a degree-11 Bezier curve at parameter `t`.
///
/// B''(t) = 11 * 10 * degree-9 Bezier on the second differences.
fn bezier_second_derivative(points: &[f64; 12], t: f64) -> f64 {
    let mut second = [0.0; 10];
    for i in 0..10 {
        second[i] = points[i + 2] - 2.0 * points[i + 1] + points[i];
    }
    110.0 * de_casteljau(second, t)
}

/// Timing and clearance of one swing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParameters {
    /// Swing duration in seconds.
    pub duration: f64,
    /// Maximum foot height above the liftoff-touchdown line (meters).
    pub step_height: f64,
}

impl StepParameters {
    pub const fn new(duration: f64, step_height: f64) -> Self {
        Self {
            duration,
            step_height,
        }
    }
}

/// Position, velocity and acceleration of a foot at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwingSample {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub acc: Vector3<f64>,
}

/// Swing trajectory of a single foot.
#[derive(Clone, Debug, PartialEq)]
pub struct SwingTrajectory {
    start_time: f64,
    start: Vector3<f64>,
    target: Vector3<f64>,
    params: StepParameters,
}

impl SwingTrajectory {
    pub fn new(
        start_time: f64,
        start: Vector3<f64>,
        target: Vector3<f64>,
        params: StepParameters,
    ) -> Self {
        Self {
            start_time,
            start,
            target,
            params,
        }
    }

    pub fn set_parameters(
        &mut self,
        start_time: f64,
        start: Vector3<f64>,
        target: Vector3<f64>,
        params: StepParameters,
    ) {
        *self = Self::new(start_time, start, target, params);
    }

    pub const fn target(&self) -> &Vector3<f64> {
        &self.target
    }

    /// Evaluate the swing at absolute `time`.
    ///
    /// Before liftoff the foot rests at the start, after touchdown at the
    /// target, both with zero velocity and acceleration.
    pub fn generate_trajectory(&self, time: f64) -> SwingSample {
        let duration = self.params.duration;
        if duration < 1e-10 {
            return SwingSample {
                pos: self.target,
                vel: Vector3::zeros(),
                acc: Vector3::zeros(),
            };
        }

        let phase = ((time - self.start_time) / duration).clamp(0.0, 1.0);
        let inv_dur = 1.0 / duration;
        let diff = self.target - self.start;
        let h_scale = self.params.step_height / BEZIER_H_PEAK;

        // Horizontal S-curve shared by all axes, height bump on z only
        let s = bezier_eval(&BEZIER_S, phase);
        let ds = bezier_derivative(&BEZIER_S, phase) * inv_dur;
        let dds = bezier_second_derivative(&BEZIER_S, phase) * inv_dur * inv_dur;

        let h = bezier_eval(&BEZIER_H, phase) * h_scale;
        let dh = bezier_derivative(&BEZIER_H, phase) * h_scale * inv_dur;
        let ddh = bezier_second_derivative(&BEZIER_H, phase) * h_scale * inv_dur * inv_dur;

        let lift = Vector3::z();
        SwingSample {
            pos: self.start + diff * s + lift * h,
            vel: diff * ds + lift * dh,
            acc: diff * dds + lift * ddh,
        }
    }
}
