pub mod analysis;
pub mod config;
pub mod error;
pub mod gram_schmidt;
pub mod lorenz;
pub mod playback;
pub mod solvers;
/// The `lorenz_core` crate estimates the Lyapunov spectrum of the Lorenz
/// attractor by integrating a trajectory together with a tangent basis and
/// re-orthonormalizing that basis every step.
///
/// Key components:
/// - **Vector**: `Vector3`, an immutable `f64` value type.
/// - **Traits**: `Scalar`, `VectorField` (integrator right-hand sides) and `TangentFlow` (field + Jacobian).
/// - **Solvers**: the classical fixed-step RK4 step.
/// - **Lorenz**: the Lorenz field and its Jacobian-vector product.
/// - **Gram-Schmidt**: classical orthogonalization preserving nested spans.
/// - **Analysis**: `LyapunovSession` (tick state machine, emission records) and the Kaplan-Yorke dimension.
/// - **Playback / Trajectory**: timer-driven playback and the bounded trail consumed by renderers.
pub mod traits;
pub mod trajectory;
pub mod vector;

pub use analysis::{
    kaplan_yorke, KyOrdering, LorenzSession, LyapunovSession, SessionStatus, TickRecord,
    TrajectoryState,
};
pub use config::AppConfig;
pub use error::{FailureKind, KaplanYorkeError, LyapunovError};
pub use lorenz::LorenzParams;
pub use vector::Vector3;
