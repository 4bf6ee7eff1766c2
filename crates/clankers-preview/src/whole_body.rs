//! Conversion between reduced and whole-body states.
//!
//! The reduced state knows nothing about joints: joint quantities come from
//! the kinematics collaborator, contact forces from the support region, and
//! the CoM from the floating-base system. The base is assumed to sit at the
//! CoM minus the default CoM offset.

use clankers_core::error::ClankersError;
use nalgebra::Vector3;
use tracing::warn;

use crate::engine::PreviewLocomotion;
use crate::frame::rotation_from_rpy;
use crate::types::{ReducedBodyState, ReducedBodyTrajectory, WholeBodyState};

impl PreviewLocomotion {
    /// Expand a reduced state into a whole-body state.
    ///
    /// Supported feet share the robot weight equally as vertical contact
    /// forces. Joint efforts are left at zero.
    ///
    /// # Errors
    ///
    /// Failures of the kinematics collaborator.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_whole_body_state(
        &self,
        reduced: &ReducedBodyState,
    ) -> Result<WholeBodyState, ClankersError> {
        let mut full = WholeBodyState::zeros(self.robot.system.joint_dof());
        full.time = reduced.time;

        full.base_pos = reduced.com_pos - self.default_com;
        full.base_vel = reduced.com_vel;
        full.base_acc = reduced.com_acc;
        full.base_rpy = reduced.angular_pos;
        full.base_ang_vel = reduced.angular_vel;
        full.base_ang_acc = reduced.angular_acc;

        full.contact_pos = reduced
            .foot_pos
            .iter()
            .map(|(foot, pos)| (foot, pos + self.default_com))
            .collect();
        full.contact_vel = reduced.foot_vel.clone();
        full.contact_acc = reduced.foot_acc.clone();

        let supported = reduced.support_region.len();
        let load = if supported > 0 {
            self.mass() * self.gravity() / supported as f64
        } else {
            0.0
        };
        for foot in self.feet.ids() {
            let force = if reduced.support_region.contains(foot) {
                Vector3::new(0.0, 0.0, load)
            } else {
                Vector3::zeros()
            };
            full.contact_eff.insert(foot, force);
        }

        let kinematics = &self.robot.kinematics;
        full.joint_pos = kinematics.inverse_kinematics(&full.contact_pos, &self.feet)?;
        full.joint_vel = kinematics.joint_velocity(&full.joint_pos, &full.contact_vel, &self.feet)?;
        full.joint_acc = kinematics.joint_acceleration(
            &full.joint_pos,
            &full.joint_vel,
            &full.contact_acc,
            &self.feet,
        )?;

        Ok(full)
    }

    /// Reduce a whole-body state. Feet whose normal force exceeds the
    /// configured threshold form the support region.
    pub fn from_whole_body_state(&self, full: &WholeBodyState) -> ReducedBodyState {
        let system = &self.robot.system;
        let dynamics = &self.robot.dynamics;
        let rotation = rotation_from_rpy(&full.base_rpy);

        let mut reduced = ReducedBodyState {
            time: full.time,
            com_pos: system.system_com(&full.base_pos, &full.joint_pos),
            com_vel: system.system_com_rate(
                &full.base_pos,
                &full.joint_pos,
                &full.base_vel,
                &full.joint_vel,
            ),
            com_acc: full.base_acc,
            angular_pos: full.base_rpy,
            angular_vel: full.base_ang_vel,
            angular_acc: full.base_ang_acc,
            ..ReducedBodyState::default()
        };

        let cop = dynamics.center_of_pressure(&full.contact_eff, &full.contact_pos);
        reduced.cop = full.base_pos + rotation * cop;

        for foot in dynamics.active_contacts(&full.contact_eff, self.config.force_threshold) {
            match full.contact_pos.get(foot) {
                Some(pos) => {
                    reduced
                        .support_region
                        .insert(foot, full.base_pos + rotation * pos);
                }
                None => warn!(foot = self.feet.name(foot), "Active contact without a position"),
            }
        }

        reduced.foot_pos = full
            .contact_pos
            .iter()
            .map(|(foot, pos)| (foot, pos - self.default_com))
            .collect();
        reduced.foot_vel = full.contact_vel.clone();
        reduced.foot_acc = full.contact_acc.clone();

        reduced
    }

    /// Expand every sample of a reduced trajectory.
    ///
    /// # Errors
    ///
    /// The first kinematics failure.
    pub fn to_whole_body_trajectory(
        &self,
        trajectory: &ReducedBodyTrajectory,
    ) -> Result<Vec<WholeBodyState>, ClankersError> {
        trajectory
            .iter()
            .map(|state| self.to_whole_body_state(state))
            .collect()
    }
}
