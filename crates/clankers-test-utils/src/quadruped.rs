//! A point-foot quadruped collaborator.
//!
//! Each leg has three Cartesian joints that directly hold the foot position
//! in the base frame, so kinematics are exact and the whole-body CoM is the
//! base plus a constant offset. Good enough to exercise the preview engine
//! and the reduced/whole-body conversions without a robot model.

use clankers_core::error::PreviewError;
use clankers_preview::{
    FloatingBaseSystem, FootMap, FootSet, PreviewLocomotion, RobotDescription, WholeBodyKinematics,
};
use nalgebra::{DVector, Vector3};

/// Foot names, front-left first.
pub const QUADRUPED_FEET: [&str; 4] = ["FL", "FR", "HL", "HR"];

/// Point-foot quadruped with Cartesian legs.
#[derive(Clone, Debug, PartialEq)]
pub struct PointFootQuadruped {
    pub mass: f64,
    pub gravity: f64,
    /// Default foot positions in the base frame, in [`QUADRUPED_FEET`] order.
    pub default_feet: [Vector3<f64>; 4],
    /// Whole-body CoM relative to the base.
    pub com_offset: Vector3<f64>,
}

impl Default for PointFootQuadruped {
    fn default() -> Self {
        Self {
            mass: 10.0,
            gravity: 9.81,
            default_feet: [
                Vector3::new(0.2, 0.15, -0.45),
                Vector3::new(0.2, -0.15, -0.45),
                Vector3::new(-0.2, 0.15, -0.45),
                Vector3::new(-0.2, -0.15, -0.45),
            ],
            com_offset: Vector3::new(0.0, 0.0, 0.05),
        }
    }
}

impl PointFootQuadruped {
    /// Collaborator bundle for the preview engine.
    pub fn description(self) -> RobotDescription {
        RobotDescription::from_model(self)
    }

    /// Engine built on this robot with default configuration.
    ///
    /// # Panics
    ///
    /// If the engine cannot be built, which only happens for a malformed
    /// robot.
    pub fn engine(self) -> PreviewLocomotion {
        PreviewLocomotion::builder()
            .with_robot(self.description())
            .build()
            .expect("point-foot quadruped builds a preview engine")
    }
}

fn leg(joints: &DVector<f64>, index: usize) -> Result<Vector3<f64>, PreviewError> {
    if joints.len() < 3 * (index + 1) {
        return Err(PreviewError::Collaborator(format!(
            "expected 12 joints, got {}",
            joints.len()
        )));
    }
    Ok(Vector3::new(
        joints[3 * index],
        joints[3 * index + 1],
        joints[3 * index + 2],
    ))
}

/// Copy per-foot vectors into the Cartesian joint layout.
fn to_joints(values: &FootMap<Vector3<f64>>, feet: &FootSet) -> Result<DVector<f64>, PreviewError> {
    let mut joints = DVector::zeros(3 * QUADRUPED_FEET.len());
    for (foot, value) in values.iter() {
        let name = feet.name(foot);
        let index = QUADRUPED_FEET
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| PreviewError::UnknownFoot {
                foot: name.to_owned(),
            })?;
        joints.fixed_rows_mut::<3>(3 * index).copy_from(value);
    }
    Ok(joints)
}

impl FloatingBaseSystem for PointFootQuadruped {
    fn total_mass(&self) -> f64 {
        self.mass
    }

    fn gravity(&self) -> f64 {
        self.gravity
    }

    fn foot_names(&self) -> Vec<String> {
        QUADRUPED_FEET.iter().map(ToString::to_string).collect()
    }

    fn joint_dof(&self) -> usize {
        3 * QUADRUPED_FEET.len()
    }

    fn default_posture(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.joint_dof(),
            self.default_feet.iter().flat_map(|p| [p.x, p.y, p.z]),
        )
    }

    fn system_com(&self, base_pos: &Vector3<f64>, _joint_pos: &DVector<f64>) -> Vector3<f64> {
        base_pos + self.com_offset
    }

    fn system_com_rate(
        &self,
        _base_pos: &Vector3<f64>,
        _joint_pos: &DVector<f64>,
        base_vel: &Vector3<f64>,
        _joint_vel: &DVector<f64>,
    ) -> Vector3<f64> {
        *base_vel
    }
}

impl WholeBodyKinematics for PointFootQuadruped {
    fn forward_kinematics(
        &self,
        joint_pos: &DVector<f64>,
        feet: &FootSet,
    ) -> Result<FootMap<Vector3<f64>>, PreviewError> {
        let mut contacts = FootMap::new();
        for (index, name) in QUADRUPED_FEET.iter().enumerate() {
            let foot = feet.require(name)?;
            contacts.insert(foot, leg(joint_pos, index)?);
        }
        Ok(contacts)
    }

    fn inverse_kinematics(
        &self,
        contact_pos: &FootMap<Vector3<f64>>,
        feet: &FootSet,
    ) -> Result<DVector<f64>, PreviewError> {
        to_joints(contact_pos, feet)
    }

    fn joint_velocity(
        &self,
        _joint_pos: &DVector<f64>,
        contact_vel: &FootMap<Vector3<f64>>,
        feet: &FootSet,
    ) -> Result<DVector<f64>, PreviewError> {
        to_joints(contact_vel, feet)
    }

    fn joint_acceleration(
        &self,
        _joint_pos: &DVector<f64>,
        _joint_vel: &DVector<f64>,
        contact_acc: &FootMap<Vector3<f64>>,
        feet: &FootSet,
    ) -> Result<DVector<f64>, PreviewError> {
        to_joints(contact_acc, feet)
    }
}
