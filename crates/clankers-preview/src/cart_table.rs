//! Cart-table (controlled linear inverted pendulum) stance model.
//!
//! The robot is a point mass at constant height h above the center of
//! pressure. With the CoP moving linearly over the phase,
//! p(t) = p₀ + ṗ t, each horizontal axis obeys
//!
//! ```text
//! ẍ = ω² (x − p),   ω = √(g / h)
//! ```
//!
//! which has the closed-form solution
//!
//! ```text
//! x(t) = p(t) + c cosh(ωt) + d sinh(ωt),   c = x₀ − p₀,  d = (ẋ₀ − ṗ) / ω
//! ```
//!
//! so any instant of the phase is evaluated directly, without integration.

use clankers_core::error::PreviewError;
use nalgebra::{Vector2, Vector3};

use crate::types::ReducedBodyState;

/// Physical properties of the cart-table model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CartTableProperties {
    /// Total robot mass in kg.
    pub mass: f64,
    /// Gravitational acceleration magnitude (positive, e.g., 9.81).
    pub gravity: f64,
}

impl Default for CartTableProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            gravity: 9.81,
        }
    }
}

/// Control of one stance phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CartTableParams {
    /// Phase duration in seconds.
    pub duration: f64,
    /// Planar CoP displacement reached at the end of the phase.
    pub cop_shift: Vector2<f64>,
}

/// Cart-table model configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct CartTableModel {
    properties: CartTableProperties,
    min_height: f64,
}

impl CartTableModel {
    /// Create a model. `min_height` is the smallest accepted pendulum height.
    pub fn new(properties: CartTableProperties, min_height: f64) -> Self {
        Self {
            properties,
            min_height,
        }
    }

    pub fn set_model_properties(&mut self, properties: CartTableProperties) {
        self.properties = properties;
    }

    pub const fn properties(&self) -> &CartTableProperties {
        &self.properties
    }

    /// Prepare the closed-form response of a phase starting at `state`.
    ///
    /// # Errors
    ///
    /// [`PreviewError::NumericDegeneracy`] when the CoM is not at least
    /// `min_height` above the CoP.
    pub fn init_response(
        &self,
        state: &ReducedBodyState,
        params: &CartTableParams,
    ) -> Result<CartTableResponse, PreviewError> {
        let height = state.pendulum_height();
        if !height.is_finite() || height < self.min_height {
            return Err(PreviewError::NumericDegeneracy { height });
        }
        let omega = (self.properties.gravity / height).sqrt();

        Ok(CartTableResponse {
            properties: self.properties,
            start_time: state.time,
            duration: params.duration,
            com_pos: state.com_pos,
            com_vel: state.com_vel,
            cop: state.cop,
            cop_rate: params.cop_shift / params.duration,
            height,
            omega,
        })
    }

    /// Energy of a stance phase starting at `state`; see
    /// [`CartTableResponse::system_energy`].
    pub fn compute_system_energy(
        &self,
        state: &ReducedBodyState,
        params: &CartTableParams,
    ) -> Result<Vector3<f64>, PreviewError> {
        Ok(self.init_response(state, params)?.system_energy())
    }
}

/// Closed-form CoM motion over one stance phase.
#[derive(Clone, Copy, Debug)]
pub struct CartTableResponse {
    properties: CartTableProperties,
    start_time: f64,
    duration: f64,
    com_pos: Vector3<f64>,
    com_vel: Vector3<f64>,
    cop: Vector3<f64>,
    cop_rate: Vector2<f64>,
    height: f64,
    omega: f64,
}

impl CartTableResponse {
    /// CoM height above the CoP at the start of the phase.
    pub const fn pendulum_height(&self) -> f64 {
        self.height
    }

    /// Natural frequency ω = √(g/h).
    pub const fn omega(&self) -> f64 {
        self.omega
    }

    /// Write CoM position, velocity, acceleration and CoP at `time` into
    /// `state`. Times past the phase end extrapolate the same solution.
    pub fn compute_response(&self, state: &mut ReducedBodyState, time: f64) {
        let t = time - self.start_time;
        let w = self.omega;
        let (sh, ch) = ((w * t).sinh(), (w * t).cosh());

        for axis in 0..2 {
            let p0 = self.cop[axis];
            let pd = self.cop_rate[axis];
            let c = self.com_pos[axis] - p0;
            let d = (self.com_vel[axis] - pd) / w;
            let p = p0 + pd * t;

            state.com_pos[axis] = p + c * ch + d * sh;
            state.com_vel[axis] = pd + w * (c * sh + d * ch);
            state.com_acc[axis] = w * w * (c * ch + d * sh);
            state.cop[axis] = p;
        }

        // Constant height
        state.com_pos.z = self.com_pos.z;
        state.com_vel.z = 0.0;
        state.com_acc.z = 0.0;
        state.cop.z = self.cop.z;
    }

    /// Integral over the phase of kinetic, pendulum-potential and CoP-control
    /// energy for x and y; the z component is the gravitational potential
    /// baseline `m g h T`.
    ///
    /// ```text
    /// E_i = ∫₀ᵀ ½m ẋᵢ² + ½m ω² (xᵢ − pᵢ)² dt + ½m ṗᵢ² T
    /// ```
    pub fn system_energy(&self) -> Vector3<f64> {
        let m = self.properties.mass;
        let g = self.properties.gravity;
        let big_t = self.duration;
        let w = self.omega;
        let u = w * big_t;

        // Basis integrals over [0, T]
        let i_sinh = (u.cosh() - 1.0) / w;
        let i_cosh = u.sinh() / w;
        let i_sinh_cosh = u.sinh().powi(2) / (2.0 * w);
        let i_cosh2 = big_t / 2.0 + (2.0 * u).sinh() / (4.0 * w);
        let i_sinh2 = (2.0 * u).sinh() / (4.0 * w) - big_t / 2.0;

        let mut energy = Vector3::zeros();
        for axis in 0..2 {
            let pd = self.cop_rate[axis];
            let c = self.com_pos[axis] - self.cop[axis];
            let d = (self.com_vel[axis] - pd) / w;

            let offset_sq = c * c * i_cosh2 + 2.0 * c * d * i_sinh_cosh + d * d * i_sinh2;
            let vel_sq = pd * pd * big_t
                + 2.0 * pd * w * (c * i_sinh + d * i_cosh)
                + w * w * (c * c * i_sinh2 + 2.0 * c * d * i_sinh_cosh + d * d * i_cosh2);

            energy[axis] = 0.5 * m * vel_sq
                + 0.5 * m * w * w * offset_sq
                + 0.5 * m * pd * pd * big_t;
        }
        energy.z = m * g * self.height * big_t;
        energy
    }
}
