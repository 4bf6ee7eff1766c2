//! Core types for the preview pipeline.

use nalgebra::{DVector, Vector2, Vector3};

use crate::foot::{FootId, FootMap};

/// CoM-centric state of the robot at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReducedBodyState {
    /// Absolute time in seconds.
    pub time: f64,
    /// Center of mass position in world frame (meters).
    pub com_pos: Vector3<f64>,
    /// Center of mass velocity in world frame (m/s).
    pub com_vel: Vector3<f64>,
    /// Center of mass acceleration in world frame (m/s²).
    pub com_acc: Vector3<f64>,
    /// Euler angles: roll, pitch, yaw (radians).
    pub angular_pos: Vector3<f64>,
    /// Euler angle rates (rad/s).
    pub angular_vel: Vector3<f64>,
    /// Euler angle accelerations (rad/s²).
    pub angular_acc: Vector3<f64>,
    /// Center of pressure in world frame.
    pub cop: Vector3<f64>,
    /// Foot positions relative to the CoM, body-oriented.
    pub foot_pos: FootMap<Vector3<f64>>,
    /// Foot velocities relative to the CoM, body-oriented.
    pub foot_vel: FootMap<Vector3<f64>>,
    /// Foot accelerations relative to the CoM, body-oriented.
    pub foot_acc: FootMap<Vector3<f64>>,
    /// World-frame contact points of the feet bearing load.
    pub support_region: FootMap<Vector3<f64>>,
}

impl ReducedBodyState {
    /// State at rest at `com_pos` with the CoP right below the CoM.
    pub fn at_rest(time: f64, com_pos: Vector3<f64>, cop_height: f64) -> Self {
        Self {
            time,
            com_pos,
            cop: Vector3::new(com_pos.x, com_pos.y, cop_height),
            ..Self::default()
        }
    }

    /// Height of the CoM above the CoP.
    pub fn pendulum_height(&self) -> f64 {
        self.com_pos.z - self.cop.z
    }
}

/// Time-ordered sequence of reduced states produced by a preview.
///
/// Times are non-decreasing, not strictly increasing: every phase after the
/// first opens with a sample at the previous phase's end time. That sample
/// carries the support region of the new phase, so consumers interpolating
/// by time should treat the pair as a step change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReducedBodyTrajectory {
    states: Vec<ReducedBodyState>,
}

impl ReducedBodyTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn first(&self) -> Option<&ReducedBodyState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&ReducedBodyState> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReducedBodyState> {
        self.states.iter()
    }

    pub fn as_slice(&self) -> &[ReducedBodyState] {
        &self.states
    }

    pub fn into_vec(self) -> Vec<ReducedBodyState> {
        self.states
    }

    pub(crate) fn extend(&mut self, states: impl IntoIterator<Item = ReducedBodyState>) {
        self.states.extend(states);
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut ReducedBodyState> {
        self.states.last_mut()
    }
}

impl From<Vec<ReducedBodyState>> for ReducedBodyTrajectory {
    fn from(states: Vec<ReducedBodyState>) -> Self {
        Self { states }
    }
}

impl<'a> IntoIterator for &'a ReducedBodyTrajectory {
    type Item = &'a ReducedBodyState;
    type IntoIter = std::slice::Iter<'a, ReducedBodyState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

impl std::ops::Index<usize> for ReducedBodyTrajectory {
    type Output = ReducedBodyState;

    fn index(&self, index: usize) -> &ReducedBodyState {
        &self.states[index]
    }
}

/// Contact regime of a phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhaseType {
    /// Ground contact: the CoP moves by `cop_shift` over the phase and the
    /// heading accelerates at `head_acc` (rad/s²).
    Stance {
        cop_shift: Vector2<f64>,
        head_acc: f64,
    },
    /// No ground contact: ballistic CoM motion.
    Flight,
}

/// One phase of the control sequence: its regime plus the planar foothold
/// shift of every foot that swings during it.
#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub kind: PhaseType,
    swing_shifts: FootMap<Vector2<f64>>,
}

impl Phase {
    pub fn stance(cop_shift: Vector2<f64>, head_acc: f64) -> Self {
        Self {
            kind: PhaseType::Stance {
                cop_shift,
                head_acc,
            },
            swing_shifts: FootMap::new(),
        }
    }

    pub fn flight() -> Self {
        Self {
            kind: PhaseType::Flight,
            swing_shifts: FootMap::new(),
        }
    }

    /// Mark `foot` as swinging towards a foothold shifted by `shift` from its
    /// nominal stance position.
    #[must_use]
    pub fn with_swing(mut self, foot: FootId, shift: Vector2<f64>) -> Self {
        self.set_swing_foot(foot, shift);
        self
    }

    pub fn set_swing_foot(&mut self, foot: FootId, shift: Vector2<f64>) {
        self.swing_shifts.insert(foot, shift);
    }

    pub fn is_stance(&self) -> bool {
        matches!(self.kind, PhaseType::Stance { .. })
    }

    pub fn is_swing_foot(&self, foot: FootId) -> bool {
        self.swing_shifts.contains(foot)
    }

    pub fn foot_shift(&self, foot: FootId) -> Option<&Vector2<f64>> {
        self.swing_shifts.get(foot)
    }

    /// Swinging feet with their planar shifts.
    pub fn swing_feet(&self) -> impl Iterator<Item = (FootId, &Vector2<f64>)> {
        self.swing_shifts.iter()
    }
}

/// Timing and regime of one phase.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewParams {
    /// Phase duration in seconds (> 0).
    pub duration: f64,
    pub phase: Phase,
}

impl PreviewParams {
    pub fn new(duration: f64, phase: Phase) -> Self {
        Self { duration, phase }
    }
}

/// Full multi-phase plan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewControl {
    pub params: Vec<PreviewParams>,
}

impl PreviewControl {
    pub fn new(params: Vec<PreviewParams>) -> Self {
        Self { params }
    }

    /// Sum of all phase durations.
    pub fn total_duration(&self) -> f64 {
        self.params.iter().map(|p| p.duration).sum()
    }
}

/// Swing targets of one phase: foothold shift (planar + vertical) from the
/// nominal stance posture, per swinging foot.
#[derive(Clone, Debug, Default)]
pub struct SwingParams {
    pub duration: f64,
    pub feet_shift: FootMap<Vector3<f64>>,
}

/// Full joint-space state of the robot.
#[derive(Clone, Debug, PartialEq)]
pub struct WholeBodyState {
    pub time: f64,
    /// Base position in world frame.
    pub base_pos: Vector3<f64>,
    /// Base linear velocity in world frame.
    pub base_vel: Vector3<f64>,
    /// Base linear acceleration in world frame.
    pub base_acc: Vector3<f64>,
    /// Base roll, pitch, yaw.
    pub base_rpy: Vector3<f64>,
    /// Base Euler angle rates.
    pub base_ang_vel: Vector3<f64>,
    /// Base Euler angle accelerations.
    pub base_ang_acc: Vector3<f64>,
    pub joint_pos: DVector<f64>,
    pub joint_vel: DVector<f64>,
    pub joint_acc: DVector<f64>,
    pub joint_eff: DVector<f64>,
    /// Contact positions in base frame.
    pub contact_pos: FootMap<Vector3<f64>>,
    /// Contact velocities in base frame.
    pub contact_vel: FootMap<Vector3<f64>>,
    /// Contact accelerations in base frame.
    pub contact_acc: FootMap<Vector3<f64>>,
    /// Contact forces in base frame.
    pub contact_eff: FootMap<Vector3<f64>>,
}

impl WholeBodyState {
    /// Zero state with `joint_dof` joints and no contacts.
    pub fn zeros(joint_dof: usize) -> Self {
        Self {
            time: 0.0,
            base_pos: Vector3::zeros(),
            base_vel: Vector3::zeros(),
            base_acc: Vector3::zeros(),
            base_rpy: Vector3::zeros(),
            base_ang_vel: Vector3::zeros(),
            base_ang_acc: Vector3::zeros(),
            joint_pos: DVector::zeros(joint_dof),
            joint_vel: DVector::zeros(joint_dof),
            joint_acc: DVector::zeros(joint_dof),
            joint_eff: DVector::zeros(joint_dof),
            contact_pos: FootMap::new(),
            contact_vel: FootMap::new(),
            contact_acc: FootMap::new(),
            contact_eff: FootMap::new(),
        }
    }
}
