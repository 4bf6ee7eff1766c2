//! Reduced-order multi-phase motion preview for legged locomotion.
//!
//! Given an initial center-of-mass state and a timed list of contact phases,
//! this crate predicts the CoM, heading and foot trajectories analytically:
//!
//! 1. **Cart-table model**: closed-form CoM motion over a stance phase with
//!    a linearly moving center of pressure
//! 2. **Flight**: projectile motion of the CoM
//! 3. **Swing generator**: Bezier foot trajectories towards the next
//!    foothold
//! 4. **Preview engine**: stitches the phases together and keeps track of
//!    the support region
//!
//! # Architecture
//!
//! Full-body quantities (mass, kinematics, contact dynamics, terrain) are
//! supplied by collaborators implementing the traits in [`model`]. The
//! engine resolves foot names once into compact [`FootId`]s and keeps all
//! per-foot data in fixed-size [`FootMap`]s.
//!
//! ```no_run
//! # fn demo(robot: clankers_preview::RobotDescription) -> Result<(), clankers_core::error::ClankersError> {
//! use clankers_preview::{PreviewLocomotion, PreviewMode};
//!
//! let engine = PreviewLocomotion::builder().with_robot(robot).build()?;
//! let sequence = engine.read_preview_sequence("walk.toml")?;
//! let trajectory =
//!     engine.multi_phase_preview(&sequence.state, &sequence.control, PreviewMode::Full)?;
//! println!("{} samples", trajectory.len());
//! # Ok(())
//! # }
//! ```

pub mod cart_table;
pub mod engine;
pub mod foot;
pub mod frame;
pub mod model;
pub mod sequence;
pub mod swing;
pub mod types;
mod whole_body;

pub use cart_table::{CartTableModel, CartTableParams, CartTableProperties, CartTableResponse};
pub use engine::{PreviewLocomotion, PreviewLocomotionBuilder, PreviewMode};
pub use foot::{FootId, FootMap, FootSet, MAX_FEET};
pub use frame::{rotation_from_rpy, to_body, to_world};
pub use model::{
    FloatingBaseSystem, NoTerrain, PointContactDynamics, RobotDescription, TerrainMap,
    WholeBodyDynamics, WholeBodyKinematics,
};
pub use sequence::{PreviewSequence, parse_preview_sequence, read_preview_sequence};
pub use swing::{StepParameters, SwingSample, SwingTrajectory};
pub use types::{
    Phase, PhaseType, PreviewControl, PreviewParams, ReducedBodyState, ReducedBodyTrajectory,
    SwingParams, WholeBodyState,
};
