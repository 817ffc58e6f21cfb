use crate::traits::{Scalar, VectorField};
use std::ops::{Add, Mul};

/// Classic Runge-Kutta 4th order step.
///
/// Advances `v` by one step of size `h` under the field `f`:
///
/// ```text
/// k1 = f(v) * h
/// k2 = f(v + k1/2) * h
/// k3 = f(v + k2/2) * h
/// k4 = f(v + k3) * h
/// v' = v + (k1 + 2k2 + 2k3 + k4) / 6
/// ```
///
/// Works for any copyable vector type that supports addition and scaling by
/// `S`, so the same routine advances the trajectory (under the Lorenz field)
/// and the tangent vectors (under the Jacobian at the current point).
pub fn rk4<S, V, F>(v: V, h: S, f: &F) -> V
where
    S: Scalar,
    V: Copy + Add<Output = V> + Mul<S, Output = V>,
    F: VectorField<V> + ?Sized,
{
    let one = S::one();
    let two = one + one;
    let half = one / two;
    let sixth = one / (two + two + two);

    let k1 = f.apply(v) * h;
    let k2 = f.apply(v + k1 * half) * h;
    let k3 = f.apply(v + k2 * half) * h;
    let k4 = f.apply(v + k3) * h;

    v + (k1 + k2 * two + k3 * two + k4) * sixth
}
