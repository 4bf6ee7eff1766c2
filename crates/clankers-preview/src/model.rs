//! Collaborator interfaces consumed by the preview engine.
//!
//! The engine never computes full-body quantities itself. Mass, kinematics,
//! contact dynamics and terrain come from implementations of the traits
//! below, bundled into a [`RobotDescription`].

use std::sync::Arc;

use clankers_core::error::PreviewError;
use nalgebra::{DVector, Vector2, Vector3};

use crate::foot::{FootId, FootMap, FootSet};

// ---------------------------------------------------------------------------
// TerrainMap
// ---------------------------------------------------------------------------

/// Terrain elevation source used to place footholds.
pub trait TerrainMap: Send + Sync {
    /// Whether elevation queries return meaningful data.
    fn has_elevation_data(&self) -> bool;

    /// Ground height at a planar world position.
    fn elevation_at(&self, position: &Vector2<f64>) -> f64;
}

/// Terrain without elevation data. Footholds fall back to the flat-ground
/// height heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTerrain;

impl TerrainMap for NoTerrain {
    fn has_elevation_data(&self) -> bool {
        false
    }

    fn elevation_at(&self, _position: &Vector2<f64>) -> f64 {
        0.0
    }
}

// ---------------------------------------------------------------------------
// FloatingBaseSystem
// ---------------------------------------------------------------------------

/// Mass properties and joint layout of a floating-base robot.
pub trait FloatingBaseSystem: Send + Sync {
    /// Total robot mass in kg.
    fn total_mass(&self) -> f64;

    /// Gravitational acceleration magnitude (positive).
    fn gravity(&self) -> f64;

    /// Names of the feet, in declaration order.
    fn foot_names(&self) -> Vec<String>;

    /// Number of actuated joints.
    fn joint_dof(&self) -> usize;

    /// Nominal joint configuration the stance posture is derived from.
    fn default_posture(&self) -> DVector<f64>;

    /// Whole-body CoM in world frame for a base position and joint
    /// configuration.
    fn system_com(&self, base_pos: &Vector3<f64>, joint_pos: &DVector<f64>) -> Vector3<f64>;

    /// Whole-body CoM velocity in world frame.
    fn system_com_rate(
        &self,
        base_pos: &Vector3<f64>,
        joint_pos: &DVector<f64>,
        base_vel: &Vector3<f64>,
        joint_vel: &DVector<f64>,
    ) -> Vector3<f64>;
}

// ---------------------------------------------------------------------------
// WholeBodyKinematics
// ---------------------------------------------------------------------------

/// Foot-level kinematics. Contact quantities are expressed in the base frame.
pub trait WholeBodyKinematics: Send + Sync {
    /// Foot positions for a joint configuration.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`PreviewError::Collaborator`].
    fn forward_kinematics(
        &self,
        joint_pos: &DVector<f64>,
        feet: &FootSet,
    ) -> Result<FootMap<Vector3<f64>>, PreviewError>;

    /// Joint configuration placing the feet at `contact_pos`.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`PreviewError::Collaborator`].
    fn inverse_kinematics(
        &self,
        contact_pos: &FootMap<Vector3<f64>>,
        feet: &FootSet,
    ) -> Result<DVector<f64>, PreviewError>;

    /// Joint velocities producing the given foot velocities.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`PreviewError::Collaborator`].
    fn joint_velocity(
        &self,
        joint_pos: &DVector<f64>,
        contact_vel: &FootMap<Vector3<f64>>,
        feet: &FootSet,
    ) -> Result<DVector<f64>, PreviewError>;

    /// Joint accelerations producing the given foot accelerations.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`PreviewError::Collaborator`].
    fn joint_acceleration(
        &self,
        joint_pos: &DVector<f64>,
        joint_vel: &DVector<f64>,
        contact_acc: &FootMap<Vector3<f64>>,
        feet: &FootSet,
    ) -> Result<DVector<f64>, PreviewError>;
}

// ---------------------------------------------------------------------------
// WholeBodyDynamics
// ---------------------------------------------------------------------------

/// Contact-force analysis.
///
/// The provided methods treat every foot as a point contact.
pub trait WholeBodyDynamics: Send + Sync {
    /// Center of pressure in the frame of `contact_pos`: the average of the
    /// contact points weighted by their normal force. Zero when no foot
    /// pushes on the ground.
    fn center_of_pressure(
        &self,
        contact_eff: &FootMap<Vector3<f64>>,
        contact_pos: &FootMap<Vector3<f64>>,
    ) -> Vector3<f64> {
        let mut weighted = Vector3::zeros();
        let mut total = 0.0;
        for (foot, force) in contact_eff.iter() {
            let Some(pos) = contact_pos.get(foot) else {
                continue;
            };
            if force.z > 0.0 {
                weighted += pos * force.z;
                total += force.z;
            }
        }
        if total > 0.0 {
            weighted / total
        } else {
            Vector3::zeros()
        }
    }

    /// Feet whose normal force exceeds `threshold`.
    fn active_contacts(&self, contact_eff: &FootMap<Vector3<f64>>, threshold: f64) -> Vec<FootId> {
        contact_eff
            .iter()
            .filter(|(_, force)| force.z > threshold)
            .map(|(foot, _)| foot)
            .collect()
    }
}

/// Point-contact dynamics using the provided [`WholeBodyDynamics`] methods.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointContactDynamics;

impl WholeBodyDynamics for PointContactDynamics {}

// ---------------------------------------------------------------------------
// RobotDescription
// ---------------------------------------------------------------------------

/// Collaborators describing one robot, shared read-only with the engine.
#[derive(Clone)]
pub struct RobotDescription {
    pub system: Arc<dyn FloatingBaseSystem>,
    pub kinematics: Arc<dyn WholeBodyKinematics>,
    pub dynamics: Arc<dyn WholeBodyDynamics>,
}

impl RobotDescription {
    /// Describe a robot with point-contact dynamics.
    pub fn new(
        system: Arc<dyn FloatingBaseSystem>,
        kinematics: Arc<dyn WholeBodyKinematics>,
    ) -> Self {
        Self {
            system,
            kinematics,
            dynamics: Arc::new(PointContactDynamics),
        }
    }

    /// Build a description from one value implementing both the system and
    /// kinematics interfaces.
    pub fn from_model<M>(model: M) -> Self
    where
        M: FloatingBaseSystem + WholeBodyKinematics + 'static,
    {
        let model = Arc::new(model);
        Self::new(model.clone(), model)
    }

    /// Replace the contact dynamics.
    #[must_use]
    pub fn with_dynamics(mut self, dynamics: Arc<dyn WholeBodyDynamics>) -> Self {
        self.dynamics = dynamics;
        self
    }
}

impl std::fmt::Debug for RobotDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotDescription")
            .field("total_mass", &self.system.total_mass())
            .field("foot_names", &self.system.foot_names())
            .finish_non_exhaustive()
    }
}
