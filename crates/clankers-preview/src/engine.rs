//! Multi-phase preview engine.
//!
//! [`PreviewLocomotion`] walks a [`PreviewControl`] phase by phase. Stance
//! phases follow the cart-table model, flight phases follow projectile
//! motion, and every foot swinging in a phase follows a
//! [`SwingTrajectory`] towards its next foothold. Each phase starts from the
//! last sample of the previous one, with the support region updated for the
//! feet that landed and the feet that lift off.
//!
//! The engine is immutable once built. Everything a call needs to remember
//! between phases lives in a context value created per call, so one engine
//! can serve concurrent callers.

use std::path::Path;
use std::sync::Arc;

use clankers_core::config::PreviewConfig;
use clankers_core::error::{ClankersError, PreviewError};
use nalgebra::{Vector2, Vector3};
use tracing::{debug, info, warn};

use crate::cart_table::{CartTableModel, CartTableParams, CartTableProperties, CartTableResponse};
use crate::foot::{FootId, FootMap, FootSet};
use crate::frame::{to_body, to_world};
use crate::model::{NoTerrain, RobotDescription, TerrainMap};
use crate::sequence::{self, PreviewSequence};
use crate::swing::{StepParameters, SwingTrajectory};
use crate::types::{
    PhaseType, PreviewControl, PreviewParams, ReducedBodyState, ReducedBodyTrajectory, SwingParams,
};

/// Tolerance when fitting samples on the sampling grid.
const GRID_EPSILON: f64 = 1e-9;

/// What a preview call produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreviewMode {
    /// Every sample of every phase, swing feet included.
    #[default]
    Full,
    /// One sample per phase, at its end. Swing generation is skipped.
    TerminalOnly,
}

// ---------------------------------------------------------------------------
// PhaseModel
// ---------------------------------------------------------------------------

/// CoM model of one phase, initialized from the phase start state.
#[derive(Clone, Copy, Debug)]
enum PhaseModel {
    Stance {
        response: CartTableResponse,
        head_acc: f64,
    },
    Flight {
        gravity: f64,
    },
}

impl PhaseModel {
    /// Write the CoM and heading motion at absolute `time` into `state`.
    fn propagate(&self, start: &ReducedBodyState, state: &mut ReducedBodyState, time: f64) {
        let t = time - start.time;
        let head_acc = match *self {
            Self::Stance { response, head_acc } => {
                response.compute_response(state, time);
                head_acc
            }
            Self::Flight { gravity } => {
                let acc = Vector3::new(0.0, 0.0, -gravity);
                state.com_pos = start.com_pos + start.com_vel * t + acc * (0.5 * t * t);
                state.com_vel = start.com_vel + acc * t;
                state.com_acc = acc;
                0.0
            }
        };

        // Heading kinematics with constant yaw acceleration
        state.angular_pos.z =
            start.angular_pos.z + start.angular_vel.z * t + 0.5 * head_acc * t * t;
        state.angular_vel.z = start.angular_vel.z + head_acc * t;
        state.angular_acc.z = head_acc;
    }

    fn energy(&self) -> Vector3<f64> {
        match self {
            Self::Stance { response, .. } => response.system_energy(),
            // Flight energy is not modeled
            Self::Flight { .. } => Vector3::zeros(),
        }
    }
}

// ---------------------------------------------------------------------------
// PreviewContext
// ---------------------------------------------------------------------------

/// Mutable state of one preview call.
struct PreviewContext {
    /// CoM height of the call's initial state, reference of the flat-ground
    /// foothold heuristic.
    initial_com_z: f64,
    /// Pendulum height of the most recent stance phase.
    pendulum_height: f64,
    phase_start: ReducedBodyState,
    swing: SwingParams,
    generators: FootMap<SwingTrajectory>,
}

impl PreviewContext {
    fn new(state: &ReducedBodyState) -> Self {
        Self {
            initial_com_z: state.com_pos.z,
            pendulum_height: state.pendulum_height(),
            phase_start: state.clone(),
            swing: SwingParams::default(),
            generators: FootMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// PreviewLocomotion
// ---------------------------------------------------------------------------

/// Reduced-order multi-phase preview of a legged robot.
pub struct PreviewLocomotion {
    pub(crate) robot: RobotDescription,
    terrain: Arc<dyn TerrainMap>,
    pub(crate) config: PreviewConfig,
    cart_table: CartTableModel,
    pub(crate) feet: FootSet,
    stance_posture: FootMap<Vector3<f64>>,
    pub(crate) default_com: Vector3<f64>,
}

impl PreviewLocomotion {
    pub fn builder() -> PreviewLocomotionBuilder {
        PreviewLocomotionBuilder::new()
    }

    /// Feet of the robot, resolved at construction.
    pub const fn feet(&self) -> &FootSet {
        &self.feet
    }

    /// Nominal foot offsets from the CoM in the default posture.
    pub const fn stance_posture(&self) -> &FootMap<Vector3<f64>> {
        &self.stance_posture
    }

    /// CoM of the default posture, relative to the base.
    pub const fn default_com(&self) -> &Vector3<f64> {
        &self.default_com
    }

    pub const fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub const fn sample_time(&self) -> f64 {
        self.config.sample_time
    }

    pub const fn robot(&self) -> &RobotDescription {
        &self.robot
    }

    pub fn terrain(&self) -> &dyn TerrainMap {
        self.terrain.as_ref()
    }

    pub fn mass(&self) -> f64 {
        self.cart_table.properties().mass
    }

    pub fn gravity(&self) -> f64 {
        self.cart_table.properties().gravity
    }

    // -----------------------------------------------------------------------
    // Preview
    // -----------------------------------------------------------------------

    /// Preview the CoM and feet over every phase of `control`, starting
    /// from `state`.
    ///
    /// # Errors
    ///
    /// Malformed controls fail before any phase is evaluated. A stance phase
    /// whose CoM is not above the CoP fails with
    /// [`PreviewError::NumericDegeneracy`]. No partial trajectory is returned.
    pub fn multi_phase_preview(
        &self,
        state: &ReducedBodyState,
        control: &PreviewControl,
        mode: PreviewMode,
    ) -> Result<ReducedBodyTrajectory, ClankersError> {
        self.validate_control(control)?;

        let mut ctx = PreviewContext::new(state);
        let mut trajectory = ReducedBodyTrajectory::new();
        let mut current = state.clone();

        for (k, params) in control.params.iter().enumerate() {
            let mut start = current;
            let previous = k.checked_sub(1).map(|i| &control.params[i]);
            self.update_support_region(&mut start, previous, params, &ctx)?;

            let model = self.phase_model(&start, params)?;
            if let PhaseModel::Stance { response, .. } = &model {
                ctx.pendulum_height = response.pendulum_height();
            }

            ctx.phase_start = start;
            let full = mode == PreviewMode::Full;
            if full {
                self.init_swing(params, &model, &mut ctx)?;
            }

            let start = &ctx.phase_start;
            let offsets = self.sample_offsets(params.duration, mode);
            debug!(
                phase = k,
                stance = params.phase.is_stance(),
                duration = params.duration,
                samples = offsets.len(),
                "Previewing phase"
            );
            let mut phase_samples = Vec::with_capacity(offsets.len());
            for offset in offsets {
                let mut sample = start.clone();
                let time = start.time + offset;
                sample.time = time;
                model.propagate(start, &mut sample, time);
                if full {
                    generate_swing(&mut sample, &ctx);
                }
                phase_samples.push(sample);
            }

            // The offsets always end at the phase end
            current = phase_samples.last().cloned().unwrap_or_else(|| start.clone());
            trajectory.extend(phase_samples);
        }

        self.close_support_region(&mut trajectory, control, &ctx)?;

        info!(
            phases = control.params.len(),
            samples = trajectory.len(),
            duration = control.total_duration(),
            "Multi-phase preview complete"
        );
        Ok(trajectory)
    }

    /// Cart-table energy of every phase (zero for flight phases).
    ///
    /// # Errors
    ///
    /// Same failures as [`Self::multi_phase_preview`].
    pub fn phase_energies(
        &self,
        state: &ReducedBodyState,
        control: &PreviewControl,
    ) -> Result<Vec<Vector3<f64>>, ClankersError> {
        self.validate_control(control)?;

        let mut energies = Vec::with_capacity(control.params.len());
        let mut current = state.clone();
        for params in &control.params {
            let model = self.phase_model(&current, params)?;
            energies.push(model.energy());

            let start = current.clone();
            model.propagate(&start, &mut current, start.time + params.duration);
            current.time = start.time + params.duration;
        }
        Ok(energies)
    }

    /// Total cart-table energy of a phase plan.
    ///
    /// # Errors
    ///
    /// Same failures as [`Self::multi_phase_preview`].
    pub fn multi_phase_energy(
        &self,
        state: &ReducedBodyState,
        control: &PreviewControl,
    ) -> Result<Vector3<f64>, ClankersError> {
        let energies = self.phase_energies(state, control)?;
        Ok(energies.iter().fold(Vector3::zeros(), |acc, e| acc + e))
    }

    // -----------------------------------------------------------------------
    // Sequence files
    // -----------------------------------------------------------------------

    /// Read a sequence file. Feet absent from the file start at their stance
    /// posture and bear load.
    ///
    /// # Errors
    ///
    /// See [`sequence::read_preview_sequence`].
    pub fn read_preview_sequence(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<PreviewSequence, ClankersError> {
        let parsed = sequence::read_preview_sequence(path, &self.feet)?;
        Ok(self.seed_feet(parsed))
    }

    /// Parse a sequence description; see [`Self::read_preview_sequence`].
    ///
    /// # Errors
    ///
    /// See [`sequence::parse_preview_sequence`].
    pub fn parse_preview_sequence(&self, text: &str) -> Result<PreviewSequence, ClankersError> {
        let parsed = sequence::parse_preview_sequence(text, &self.feet)?;
        Ok(self.seed_feet(parsed))
    }

    fn seed_feet(&self, mut parsed: PreviewSequence) -> PreviewSequence {
        let state = &mut parsed.state;
        for (foot, stance) in self.stance_posture.iter() {
            if !state.foot_pos.contains(foot) {
                state.foot_pos.insert(foot, *stance);
            }
            if !state.support_region.contains(foot) {
                let contact = state.com_pos + to_world(stance, &state.angular_pos);
                state.support_region.insert(foot, contact);
            }
        }
        parsed
    }

    // -----------------------------------------------------------------------
    // Phase helpers
    // -----------------------------------------------------------------------

    fn validate_control(&self, control: &PreviewControl) -> Result<(), PreviewError> {
        if control.params.is_empty() {
            return Err(PreviewError::EmptyControl);
        }
        for (k, params) in control.params.iter().enumerate() {
            if !params.duration.is_finite() || params.duration <= 0.0 {
                return Err(PreviewError::InvalidDuration {
                    phase: k,
                    duration: params.duration,
                });
            }
            if let Some((foot, _)) = params
                .phase
                .swing_feet()
                .find(|(foot, _)| !self.feet.contains(*foot))
            {
                return Err(PreviewError::UnknownFoot {
                    foot: foot.to_string(),
                });
            }
        }
        Ok(())
    }

    fn phase_model(
        &self,
        start: &ReducedBodyState,
        params: &PreviewParams,
    ) -> Result<PhaseModel, PreviewError> {
        match params.phase.kind {
            PhaseType::Stance {
                cop_shift,
                head_acc,
            } => {
                let cart_params = CartTableParams {
                    duration: params.duration,
                    cop_shift,
                };
                let response = self.cart_table.init_response(start, &cart_params)?;
                Ok(PhaseModel::Stance { response, head_acc })
            }
            PhaseType::Flight => Ok(PhaseModel::Flight {
                gravity: self.gravity(),
            }),
        }
    }

    /// Sample offsets from the phase start: the sampling grid strictly
    /// before the phase end, then the exact phase end.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn sample_offsets(&self, duration: f64, mode: PreviewMode) -> Vec<f64> {
        match mode {
            PreviewMode::TerminalOnly => vec![duration],
            PreviewMode::Full => {
                let step = self.config.sample_time;
                let grid = (duration / step + GRID_EPSILON).floor() as usize;
                (0..grid)
                    .map(|i| i as f64 * step)
                    .chain(std::iter::once(duration))
                    .collect()
            }
        }
    }

    /// Support region at the start of a phase: feet that swung during the
    /// previous phase land on their footholds, feet swinging now lift off.
    fn update_support_region(
        &self,
        state: &mut ReducedBodyState,
        previous: Option<&PreviewParams>,
        params: &PreviewParams,
        ctx: &PreviewContext,
    ) -> Result<(), PreviewError> {
        if let Some(previous) = previous.filter(|p| p.duration > self.config.sample_time) {
            for (foot, shift) in previous.phase.swing_feet() {
                let foothold = self.foothold(state, foot, shift, ctx)?;
                state.support_region.insert(foot, foothold);
            }
        }
        for (foot, _) in params.phase.swing_feet() {
            state.support_region.remove(foot);
        }
        Ok(())
    }

    /// Land the feet still swinging at the end of the plan.
    fn close_support_region(
        &self,
        trajectory: &mut ReducedBodyTrajectory,
        control: &PreviewControl,
        ctx: &PreviewContext,
    ) -> Result<(), PreviewError> {
        let Some(last_params) = control.params.last() else {
            return Ok(());
        };
        if last_params.duration <= self.config.sample_time {
            return Ok(());
        }
        let Some(last) = trajectory.last_mut() else {
            return Ok(());
        };
        let footholds = last_params
            .phase
            .swing_feet()
            .map(|(foot, shift)| Ok((foot, self.foothold(last, foot, shift, ctx)?)))
            .collect::<Result<Vec<_>, PreviewError>>()?;
        for (foot, foothold) in footholds {
            last.support_region.insert(foot, foothold);
        }
        Ok(())
    }

    /// World foothold of a foot shifted by `shift` from its stance position
    /// around the CoM of `state`.
    fn foothold(
        &self,
        state: &ReducedBodyState,
        foot: FootId,
        shift: &Vector2<f64>,
        ctx: &PreviewContext,
    ) -> Result<Vector3<f64>, PreviewError> {
        let stance = self.stance_offset(foot)?;
        let offset = stance + Vector3::new(shift.x, shift.y, 0.0);
        let mut foothold = state.com_pos + to_world(&offset, &state.angular_pos);
        foothold.z = if self.terrain.has_elevation_data() {
            self.terrain.elevation_at(&foothold.xy())
        } else {
            flat_ground_height(ctx, stance.z, state.com_pos.z)
        };
        Ok(foothold)
    }

    fn stance_offset(&self, foot: FootId) -> Result<Vector3<f64>, PreviewError> {
        self.stance_posture
            .get(foot)
            .copied()
            .ok_or_else(|| PreviewError::MissingStancePosture(self.feet.name(foot).to_owned()))
    }

    /// Set up the swing generators of the phase starting at
    /// `ctx.phase_start`.
    fn init_swing(
        &self,
        params: &PreviewParams,
        model: &PhaseModel,
        ctx: &mut PreviewContext,
    ) -> Result<(), PreviewError> {
        let start = &ctx.phase_start;
        let mut terminal = start.clone();
        model.propagate(start, &mut terminal, start.time + params.duration);

        let mut feet_shift = FootMap::new();
        for (foot, shift) in params.phase.swing_feet() {
            let stance = self.stance_offset(foot)?;
            let shift_z = if self.terrain.has_elevation_data() {
                let offset = stance + Vector3::new(shift.x, shift.y, 0.0);
                let foothold = terminal.com_pos + to_world(&offset, &terminal.angular_pos);
                self.terrain.elevation_at(&foothold.xy()) - (terminal.com_pos.z + stance.z)
            } else {
                flat_ground_height(ctx, stance.z, terminal.com_pos.z)
            };
            feet_shift.insert(foot, Vector3::new(shift.x, shift.y, shift_z));
        }

        let step = StepParameters::new(params.duration, self.config.step_height);
        let mut generators = FootMap::new();
        for (foot, shift) in feet_shift.iter() {
            let stance = self.stance_offset(foot)?;
            let liftoff = start.foot_pos.get(foot).copied().unwrap_or_else(|| {
                warn!(
                    foot = self.feet.name(foot),
                    "Swing foot has no position, lifting off from its stance posture"
                );
                stance
            });
            generators.insert(
                foot,
                SwingTrajectory::new(start.time, liftoff, stance + shift, step),
            );
        }

        ctx.swing = SwingParams {
            duration: params.duration,
            feet_shift,
        };
        ctx.generators = generators;
        Ok(())
    }
}

/// Flat-ground foothold height: the foot sits one pendulum height below the
/// CoM, corrected by the CoM height drift since the start of the call.
fn flat_ground_height(ctx: &PreviewContext, stance_z: f64, com_z: f64) -> f64 {
    -(ctx.pendulum_height + stance_z) - (com_z - ctx.initial_com_z)
}

/// Write the feet of `state`: swinging feet follow their generator, the
/// others stay fixed on the ground and move opposite to the CoM in the CoM
/// frame.
fn generate_swing(state: &mut ReducedBodyState, ctx: &PreviewContext) {
    for (foot, generator) in ctx.generators.iter() {
        let sample = generator.generate_trajectory(state.time);
        state.foot_pos.insert(foot, sample.pos);
        state.foot_vel.insert(foot, sample.vel);
        state.foot_acc.insert(foot, sample.acc);
    }

    let start = &ctx.phase_start;
    let rpy = state.angular_pos;
    let com_disp = state.com_pos - start.com_pos;
    for (foot, liftoff) in start.foot_pos.iter() {
        if ctx.swing.feet_shift.contains(foot) {
            continue;
        }
        state.foot_pos.insert(foot, liftoff - to_body(&com_disp, &rpy));
        state.foot_vel.insert(foot, to_body(&-state.com_vel, &rpy));
        state.foot_acc.insert(foot, to_body(&-state.com_acc, &rpy));
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`PreviewLocomotion`].
///
/// A robot description is mandatory; terrain defaults to [`NoTerrain`] and
/// configuration to [`PreviewConfig::default`].
#[derive(Default)]
pub struct PreviewLocomotionBuilder {
    robot: Option<RobotDescription>,
    terrain: Option<Arc<dyn TerrainMap>>,
    config: PreviewConfig,
}

impl PreviewLocomotionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_robot(mut self, robot: RobotDescription) -> Self {
        self.robot = Some(robot);
        self
    }

    #[must_use]
    pub fn with_terrain<T: TerrainMap + 'static>(self, terrain: T) -> Self {
        self.with_shared_terrain(Arc::new(terrain))
    }

    /// Use a terrain map shared with other owners.
    #[must_use]
    pub fn with_shared_terrain(mut self, terrain: Arc<dyn TerrainMap>) -> Self {
        self.terrain = Some(terrain);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: PreviewConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve the feet and compute the stance posture.
    ///
    /// # Errors
    ///
    /// [`PreviewError::Uninitialized`] without a robot, configuration errors,
    /// invalid foot sets, kinematics failures and feet missing from forward
    /// kinematics.
    pub fn build(self) -> Result<PreviewLocomotion, ClankersError> {
        let robot = self.robot.ok_or(PreviewError::Uninitialized)?;
        self.config.validate()?;

        let system = &robot.system;
        let feet = FootSet::new(system.foot_names())?;

        // Stance posture: feet around the CoM in the default posture
        let posture = system.default_posture();
        let default_com = system.system_com(&Vector3::zeros(), &posture);
        let contacts = robot.kinematics.forward_kinematics(&posture, &feet)?;
        let mut stance_posture = FootMap::new();
        for foot in feet.ids() {
            let contact = contacts
                .get(foot)
                .ok_or_else(|| PreviewError::MissingStancePosture(feet.name(foot).to_owned()))?;
            stance_posture.insert(foot, contact - default_com);
        }

        let properties = CartTableProperties {
            mass: system.total_mass(),
            gravity: system.gravity(),
        };
        let cart_table = CartTableModel::new(properties, self.config.min_pendulum_height);

        info!(
            feet = feet.len(),
            mass = properties.mass,
            sample_hz = self.config.sample_hz(),
            "Preview engine ready"
        );

        Ok(PreviewLocomotion {
            robot,
            terrain: self.terrain.unwrap_or_else(|| Arc::new(NoTerrain)),
            config: self.config,
            cart_table,
            feet,
            stance_posture,
            default_com,
        })
    }
}
