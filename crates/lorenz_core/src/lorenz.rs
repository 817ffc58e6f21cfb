//! The Lorenz vector field and its linearization.

use crate::traits::TangentFlow;
use crate::vector::Vector3;
use serde::{Deserialize, Serialize};

/// Parameters `(σ, ρ, β)` of the Lorenz system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzParams {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

impl LorenzParams {
    pub fn new(sigma: f64, rho: f64, beta: f64) -> Self {
        Self { sigma, rho, beta }
    }

    /// Returns the Jacobian-vector product frozen at `base`.
    ///
    /// The closure must be taken from the trajectory position at the start of
    /// a step, before the trajectory itself is advanced.
    pub fn jacobian_at(self, base: Vector3) -> impl Fn(Vector3) -> Vector3 + Copy {
        move |v| self.jacobian_product(base, v)
    }

    /// The full Jacobian matrix at `p`, row-major.
    pub fn jacobian_matrix(&self, p: Vector3) -> [[f64; 3]; 3] {
        [
            [-self.sigma, self.sigma, 0.0],
            [self.rho - p.z, -1.0, -p.x],
            [p.y, p.x, -self.beta],
        ]
    }

    /// Trace of the Jacobian, `-σ - 1 - β`.
    ///
    /// It does not depend on the position, so it is also the exact sum of the
    /// Lyapunov exponents of the continuous flow.
    pub fn divergence(&self) -> f64 {
        -self.sigma - 1.0 - self.beta
    }

    pub fn is_finite(&self) -> bool {
        self.sigma.is_finite() && self.rho.is_finite() && self.beta.is_finite()
    }
}

impl TangentFlow for LorenzParams {
    fn field(&self, p: Vector3) -> Vector3 {
        let xdot = self.sigma * (p.y - p.x);
        let ydot = p.x * (self.rho - p.z) - p.y;
        let zdot = p.x * p.y - (self.beta * p.z);
        Vector3::new(xdot, ydot, zdot)
    }

    fn jacobian_product(&self, base: Vector3, v: Vector3) -> Vector3 {
        let dxdot = -self.sigma * v.x + self.sigma * v.y;
        let dydot = (self.rho - base.z) * v.x - v.y - base.x * v.z;
        let dzdot = base.y * v.x + base.x * v.y - self.beta * v.z;
        Vector3::new(dxdot, dydot, dzdot)
    }
}
