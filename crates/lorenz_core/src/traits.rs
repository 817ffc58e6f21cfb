use crate::vector::Vector3;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the integrators.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A right-hand side `f(v)` for a fixed-step integrator.
///
/// Implementations must be pure: the same input always yields the same output,
/// so one integrator can advance the trajectory and every tangent vector
/// within a single tick.
pub trait VectorField<V> {
    fn apply(&self, v: V) -> V;
}

impl<V, F> VectorField<V> for F
where
    F: Fn(V) -> V,
{
    fn apply(&self, v: V) -> V {
        self(v)
    }
}

/// A three dimensional flow together with its linearization.
///
/// This is the seam through which the Lyapunov accumulator can be pointed at
/// a vector field other than the Lorenz system.
pub trait TangentFlow {
    /// Evaluates the vector field at `p`.
    fn field(&self, p: Vector3) -> Vector3;

    /// Evaluates the Jacobian at `base` applied to the tangent vector `v`.
    fn jacobian_product(&self, base: Vector3, v: Vector3) -> Vector3;
}
