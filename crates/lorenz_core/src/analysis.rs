//! Lyapunov exponent accumulation and the Kaplan-Yorke dimension.

use crate::config::{InitialConditions, SimulationConfig};
use crate::error::{FailureKind, KaplanYorkeError, LyapunovError};
use crate::gram_schmidt::orthogonalize3;
use crate::lorenz::LorenzParams;
use crate::solvers::rk4;
use crate::traits::TangentFlow;
use crate::vector::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

/// Order in which exponents are fed to [`kaplan_yorke`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KyOrdering {
    /// Use the exponents in basis order. The accumulator produces them in
    /// descending order once the estimates have settled.
    #[default]
    AsGiven,
    /// Sort descending first, so transient misordering cannot skew the result.
    SortDescending,
}

/// Kaplan-Yorke (Lyapunov) dimension of an exponent spectrum.
///
/// With cumulative sums `cum[k] = λ0 + ... + λk`, finds the largest `k` such
/// that `cum[k] >= 0` and returns `(k + 1) + cum[k] / |λ(k+1)|`.
pub fn kaplan_yorke(exponents: &[f64], ordering: KyOrdering) -> Result<f64, KaplanYorkeError> {
    let mut ordered = exponents.to_vec();
    if ordering == KyOrdering::SortDescending {
        ordered.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    }

    let mut partial = 0.0;
    let mut boundary: Option<(usize, f64)> = None;
    for (idx, &lambda) in ordered.iter().enumerate() {
        partial += lambda;
        if partial >= 0.0 {
            boundary = Some((idx, partial));
        }
    }

    let (k, cum) = boundary.ok_or(KaplanYorkeError::NoNonNegativePrefix)?;
    let next = k + 1;
    // `k` is the last non-negative prefix, so `λ(k+1)` is strictly negative.
    let denom = ordered
        .get(next)
        .ok_or(KaplanYorkeError::IndexOutOfRange {
            index: next,
            len: ordered.len(),
        })?
        .abs();
    Ok(next as f64 + cum / denom)
}

/// Where the accumulator is in its run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "failure")]
pub enum SessionStatus {
    Idle,
    Running,
    Halted(FailureKind),
}

/// Position along the trajectory and the simulated clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryState {
    pub x: Vector3,
    pub x_prev: Vector3,
    pub t: f64,
    pub h: f64,
    pub iteration: u64,
}

/// Everything produced by one tick, handed to renderers and tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRecord {
    pub t: f64,
    pub iteration: u64,
    pub x: Vector3,
    pub x_prev: Vector3,
    pub previous_basis: [Vector3; 3],
    pub advanced_basis: [Vector3; 3],
    pub orthogonal_basis: [Vector3; 3],
    pub orthonormal_basis: [Vector3; 3],
    pub exponents: [f64; 3],
    pub exponent_sum: f64,
    /// `None` when the dimension is undefined for the current estimates.
    pub ky_dimension: Option<f64>,
}

/// A fully computed tick that has not been committed to the session yet.
struct PendingTick {
    record: TickRecord,
    sums: [f64; 3],
}

/// One simulation: a trajectory, its tangent basis and the running log-growth sums.
///
/// Each [`tick`](Self::tick) advances the trajectory with RK4, advances every
/// basis vector with RK4 under the Jacobian frozen at the pre-step position,
/// re-orthonormalizes the basis with Gram-Schmidt and adds the log of each
/// un-normalised length to its sum. Exponent `i` is `sums[i] / t`.
///
/// A failed tick commits nothing and halts the session until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct LyapunovSession<F: TangentFlow = LorenzParams> {
    flow: F,
    initial: InitialConditions,
    ky_ordering: KyOrdering,
    state: TrajectoryState,
    basis: [Vector3; 3],
    sums: [f64; 3],
    exponents: [f64; 3],
    status: SessionStatus,
}

/// A session over the Lorenz system.
pub type LorenzSession = LyapunovSession<LorenzParams>;

impl LorenzSession {
    /// Builds a Lorenz session from a validated configuration.
    pub fn new(config: SimulationConfig) -> anyhow::Result<Self> {
        config.validate()?;
        info!(
            sigma = config.params.sigma,
            rho = config.params.rho,
            beta = config.params.beta,
            h = config.step_size,
            "created Lorenz Lyapunov session"
        );
        Ok(Self::with_flow(
            config.params,
            config.initial,
            config.step_size,
            config.ky_ordering,
        ))
    }
}

impl Default for LorenzSession {
    fn default() -> Self {
        let config = SimulationConfig::default();
        Self::with_flow(
            config.params,
            config.initial,
            config.step_size,
            config.ky_ordering,
        )
    }
}

impl<F: TangentFlow> LyapunovSession<F> {
    /// Builds a session over an arbitrary flow. Inputs are taken as given.
    pub fn with_flow(
        flow: F,
        initial: InitialConditions,
        h: f64,
        ky_ordering: KyOrdering,
    ) -> Self {
        Self {
            flow,
            initial,
            ky_ordering,
            state: Self::initial_state(&initial, h),
            basis: initial.basis,
            sums: [0.0; 3],
            exponents: [0.0; 3],
            status: SessionStatus::Idle,
        }
    }

    fn initial_state(initial: &InitialConditions, h: f64) -> TrajectoryState {
        TrajectoryState {
            x: initial.position,
            x_prev: initial.position,
            t: 0.0,
            h,
            iteration: 0,
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn state(&self) -> &TrajectoryState {
        &self.state
    }

    pub fn basis(&self) -> &[Vector3; 3] {
        &self.basis
    }

    pub fn sums(&self) -> [f64; 3] {
        self.sums
    }

    pub fn exponents(&self) -> [f64; 3] {
        self.exponents
    }

    pub fn exponent_sum(&self) -> f64 {
        self.exponents.iter().sum()
    }

    pub fn ky_ordering(&self) -> KyOrdering {
        self.ky_ordering
    }

    pub fn kaplan_yorke(&self) -> Result<f64, KaplanYorkeError> {
        kaplan_yorke(&self.exponents, self.ky_ordering)
    }

    /// Moves to `Running`. A halted session must be reset first.
    pub fn start(&mut self) -> Result<(), LyapunovError> {
        match self.status {
            SessionStatus::Halted(kind) => Err(LyapunovError::Halted(kind)),
            SessionStatus::Running => Ok(()),
            SessionStatus::Idle => {
                info!(t = self.state.t, "session started");
                self.status = SessionStatus::Running;
                Ok(())
            }
        }
    }

    /// Moves a running session back to `Idle`. Halted sessions stay halted.
    pub fn stop(&mut self) {
        if self.status == SessionStatus::Running {
            info!(t = self.state.t, "session stopped");
            self.status = SessionStatus::Idle;
        }
    }

    /// Restores the initial conditions, clears the sums and returns to `Idle`.
    pub fn reset(&mut self) {
        info!("session reset");
        self.state = Self::initial_state(&self.initial, self.state.h);
        self.basis = self.initial.basis;
        self.sums = [0.0; 3];
        self.exponents = [0.0; 3];
        self.status = SessionStatus::Idle;
    }

    /// Advances the session by one step of size `h`.
    ///
    /// Allowed in `Idle` (single-step) and `Running`. On failure nothing is
    /// committed and the session halts with the failure kind.
    pub fn tick(&mut self) -> Result<TickRecord, LyapunovError> {
        if let SessionStatus::Halted(kind) = self.status {
            return Err(LyapunovError::Halted(kind));
        }
        match self.compute_tick() {
            Ok(pending) => {
                let record = pending.record;
                self.state = TrajectoryState {
                    x: record.x,
                    x_prev: record.x_prev,
                    t: record.t,
                    h: self.state.h,
                    iteration: record.iteration,
                };
                self.basis = record.orthonormal_basis;
                self.sums = pending.sums;
                self.exponents = record.exponents;
                trace!(t = record.t, exponents = ?record.exponents, "tick");
                Ok(record)
            }
            Err(err) => {
                warn!(t = self.state.t, error = %err, "tick failed; halting session");
                self.status = SessionStatus::Halted(err.kind());
                Err(err)
            }
        }
    }

    /// Runs up to `ticks` ticks, stopping at the first failure. Returns the
    /// last record, or `None` when `ticks` is zero.
    pub fn run(&mut self, ticks: usize) -> Result<Option<TickRecord>, LyapunovError> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(self.tick()?);
        }
        Ok(last)
    }

    fn compute_tick(&self) -> Result<PendingTick, LyapunovError> {
        let h = self.state.h;
        let t = self.state.t + h;
        let x_prev = self.state.x;

        // The linearization uses the position at the start of the step.
        let flow = &self.flow;
        let jacobian = |v: Vector3| flow.jacobian_product(x_prev, v);
        let field = |p: Vector3| flow.field(p);

        let x = rk4(x_prev, h, &field);
        if !x.is_finite() {
            return Err(LyapunovError::Diverged {
                quantity: "trajectory",
            });
        }

        let previous_basis = self.basis;
        let advanced_basis = previous_basis.map(|p| rk4(p, h, &jacobian));
        if advanced_basis.iter().any(|u| !u.is_finite()) {
            return Err(LyapunovError::Diverged {
                quantity: "perturbation basis",
            });
        }

        let pair = orthogonalize3(&advanced_basis)?;

        let mut sums = self.sums;
        for (sum, u) in sums.iter_mut().zip(&pair.orthogonal) {
            *sum += u.length().ln();
        }
        if sums.iter().any(|s| !s.is_finite()) {
            return Err(LyapunovError::Diverged {
                quantity: "exponent sums",
            });
        }
        let exponents = sums.map(|s| s / t);
        if exponents.iter().any(|e| !e.is_finite()) {
            return Err(LyapunovError::Diverged {
                quantity: "exponents",
            });
        }

        Ok(PendingTick {
            record: TickRecord {
                t,
                iteration: self.state.iteration + 1,
                x,
                x_prev,
                previous_basis,
                advanced_basis,
                orthogonal_basis: pair.orthogonal,
                orthonormal_basis: pair.orthonormal,
                exponents,
                exponent_sum: exponents.iter().sum(),
                ky_dimension: kaplan_yorke(&exponents, self.ky_ordering).ok(),
            },
            sums,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{kaplan_yorke, KyOrdering, LorenzSession, LyapunovSession, SessionStatus};
    use crate::config::{InitialConditions, SimulationConfig};
    use crate::error::{FailureKind, KaplanYorkeError, LyapunovError};
    use crate::lorenz::LorenzParams;
    use crate::traits::TangentFlow;
    use crate::vector::Vector3;

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    /// A linear flow `x' = diag(a, b, c) x` with known exponents `a, b, c`.
    struct Diagonal([f64; 3]);

    impl TangentFlow for Diagonal {
        fn field(&self, p: Vector3) -> Vector3 {
            Vector3::new(self.0[0] * p.x, self.0[1] * p.y, self.0[2] * p.z)
        }

        fn jacobian_product(&self, _base: Vector3, v: Vector3) -> Vector3 {
            self.field(v)
        }
    }

    #[test]
    fn kaplan_yorke_matches_published_lorenz_value() {
        let exponents = [0.9056, 0.0, -14.5723];
        let dim = kaplan_yorke(&exponents, KyOrdering::AsGiven).expect("defined");
        assert!((dim - 2.0621).abs() < 1e-3, "dim={dim}");
    }

    #[test]
    fn kaplan_yorke_handles_partial_sum() {
        let result = kaplan_yorke(&[0.1, 0.0, -1.0], KyOrdering::AsGiven).expect("defined");
        assert!((result - 2.1).abs() < 1e-12);
        let result = kaplan_yorke(&[0.5, -1.0, -2.0], KyOrdering::AsGiven).expect("defined");
        assert!((result - 1.5).abs() < 1e-12);
    }

    #[test]
    fn kaplan_yorke_reports_undefined_cases() {
        assert_eq!(
            kaplan_yorke(&[], KyOrdering::AsGiven),
            Err(KaplanYorkeError::NoNonNegativePrefix)
        );
        assert_eq!(
            kaplan_yorke(&[-0.1, -1.0, -2.0], KyOrdering::AsGiven),
            Err(KaplanYorkeError::NoNonNegativePrefix)
        );
        assert_eq!(
            kaplan_yorke(&[1.0, 0.5, -0.2], KyOrdering::AsGiven),
            Err(KaplanYorkeError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            kaplan_yorke(&[0.3, 0.0, 0.0], KyOrdering::AsGiven),
            Err(KaplanYorkeError::IndexOutOfRange { index: 3, len: 3 })
        );
        // A trailing zero exponent keeps the last prefix non-negative.
        assert_eq!(
            kaplan_yorke(&[-0.5, 1.0, 0.0], KyOrdering::AsGiven),
            Err(KaplanYorkeError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn kaplan_yorke_skips_past_zero_exponents() {
        let dim = kaplan_yorke(&[0.5, 0.0, -1.0], KyOrdering::AsGiven).expect("defined");
        assert!((dim - 2.5).abs() < 1e-12);
        let dim = kaplan_yorke(&[-0.5, 1.0, 0.0, -2.0], KyOrdering::AsGiven).expect("defined");
        assert!((dim - 3.25).abs() < 1e-12);
    }

    #[test]
    fn kaplan_yorke_ordering_controls_sorting() {
        let unsorted = [0.0, -14.5723, 0.9056];
        let as_given = kaplan_yorke(&unsorted, KyOrdering::AsGiven).expect("defined");
        assert!((as_given - 1.0).abs() < 1e-12);
        let sorted = kaplan_yorke(&unsorted, KyOrdering::SortDescending).expect("defined");
        assert!((sorted - 2.0621).abs() < 1e-3);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = SimulationConfig::default();
        config.step_size = -0.01;
        assert_err_contains(LyapunovSession::new(config), "Step size");
    }

    #[test]
    fn one_tick_matches_literal_rk4() {
        let mut session = LyapunovSession::new(SimulationConfig::default()).expect("valid");
        let record = session.tick().expect("tick");

        let (s, r, b) = (10.0_f64, 28.0_f64, 8.0_f64 / 3.0);
        let f = |p: Vector3| {
            Vector3::new(
                s * (p.y - p.x),
                p.x * (r - p.z) - p.y,
                p.x * p.y - (b * p.z),
            )
        };
        let h = 0.01;
        let x0 = Vector3::new(5.2, 8.5, 27.0);
        let k1 = f(x0) * h;
        let k2 = f(x0 + k1 * 0.5) * h;
        let k3 = f(x0 + k2 * 0.5) * h;
        let k4 = f(x0 + k3) * h;
        let expected = x0 + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (1.0 / 6.0);

        assert_eq!(record.x, expected);
        assert_eq!(record.x_prev, x0);
        assert_eq!(record.t, 0.01);
        assert_eq!(record.iteration, 1);
        assert_eq!(record.previous_basis, Vector3::standard_basis());

        // Pinned golden position after one step.
        let golden = Vector3::new(5.512731211918493, 8.47595037893716, 26.738359982719405);
        assert!(record.x.distance(golden) < 1e-12, "x={:?}", record.x);
    }

    #[test]
    fn one_tick_exponents_are_log_lengths_over_time() {
        let mut session = LorenzSession::default();
        let record = session.tick().expect("tick");
        for i in 0..3 {
            let expected = record.orthogonal_basis[i].length().ln() / record.t;
            assert_eq!(record.exponents[i], expected);
            assert_eq!(session.sums()[i], record.orthogonal_basis[i].length().ln());
        }
        let golden = [-9.563626584818628, -1.0667057937003013, -3.036293615888857];
        for (e, g) in record.exponents.iter().zip(golden) {
            assert!((e - g).abs() < 1e-9, "e={e} g={g}");
        }
        assert_eq!(session.basis(), &record.orthonormal_basis);
        assert_eq!(record.exponent_sum, record.exponents.iter().sum::<f64>());
    }

    #[test]
    fn jacobian_uses_pre_step_position() {
        let mut session = LorenzSession::default();
        let params = LorenzParams::default();
        let record = session.tick().expect("tick");
        let jac = params.jacobian_at(record.x_prev);
        let expected = Vector3::standard_basis().map(|p| crate::solvers::rk4(p, 0.01, &jac));
        assert_eq!(record.advanced_basis, expected);
    }

    #[test]
    fn basis_stays_orthonormal() {
        let mut session = LorenzSession::default();
        session.run(500).expect("run");
        let basis = session.basis();
        for i in 0..3 {
            assert!((basis[i].length() - 1.0).abs() < 1e-12);
            for j in (i + 1)..3 {
                assert!(basis[i].dot(basis[j]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn long_run_exponents_converge() {
        let mut session = LorenzSession::default();
        let record = session.run(10_000).expect("run").expect("record");
        let params = LorenzParams::default();

        assert!((record.t - 100.0).abs() < 1e-9);
        assert!(
            (record.exponent_sum - params.divergence()).abs() < 0.01,
            "sum={}",
            record.exponent_sum
        );
        let [l1, l2, l3] = record.exponents;
        assert!(l1 > 0.6 && l1 < 1.1, "l1={l1}");
        assert!(l2.abs() < 0.1, "l2={l2}");
        assert!(l3 < -14.0 && l3 > -15.0, "l3={l3}");

        let dim = record.ky_dimension.expect("dimension defined");
        assert!(dim > 2.0 && dim < 2.1, "dim={dim}");
    }

    #[test]
    fn exponent_sum_tracks_divergence_over_time() {
        let mut session = LorenzSession::default();
        let divergence = LorenzParams::default().divergence();
        for _ in 0..5 {
            let record = session.run(1_000).expect("run").expect("record");
            assert!((record.exponent_sum - divergence).abs() < 1e-3);
        }
    }

    #[test]
    fn diagonal_flow_recovers_rates() {
        let initial = InitialConditions {
            position: Vector3::new(1.0, 1.0, 1.0),
            basis: Vector3::standard_basis(),
        };
        let mut session = LyapunovSession::with_flow(
            Diagonal([0.5, -0.25, -2.0]),
            initial,
            0.01,
            KyOrdering::AsGiven,
        );
        let record = session.run(200).expect("run").expect("record");
        for (e, rate) in record.exponents.iter().zip([0.5, -0.25, -2.0]) {
            assert!((e - rate).abs() < 1e-8, "e={e} rate={rate}");
        }
        let dim = record.ky_dimension.expect("dimension defined");
        assert!((dim - 2.125).abs() < 1e-7, "dim={dim}");
    }

    #[test]
    fn lifecycle_transitions() {
        let mut session = LorenzSession::default();
        assert_eq!(session.status(), SessionStatus::Idle);

        session.tick().expect("single step while idle");
        assert_eq!(session.status(), SessionStatus::Idle);

        session.start().expect("start");
        assert_eq!(session.status(), SessionStatus::Running);
        session.tick().expect("tick while running");
        assert_eq!(session.status(), SessionStatus::Running);

        session.stop();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.state().iteration, 2);

        session.reset();
        assert_eq!(session.state().iteration, 0);
        assert_eq!(session.state().t, 0.0);
        assert_eq!(session.state().x, Vector3::new(5.2, 8.5, 27.0));
        assert_eq!(session.basis(), &Vector3::standard_basis());
        assert_eq!(session.sums(), [0.0; 3]);
        assert_eq!(session.exponents(), [0.0; 3]);
    }

    #[test]
    fn reset_replays_identically() {
        let mut session = LorenzSession::default();
        let first = session.run(50).expect("run");
        session.reset();
        let second = session.run(50).expect("run");
        assert_eq!(first, second);
    }

    #[test]
    fn independent_sessions_do_not_share_state() {
        let mut a = LorenzSession::default();
        let mut config = SimulationConfig::default();
        config.params.rho = 99.96;
        let mut b = LyapunovSession::new(config).expect("valid");
        a.run(10).expect("run");
        assert_eq!(b.state().iteration, 0);
        b.tick().expect("tick");
        assert_eq!(a.state().iteration, 10);
        assert_ne!(a.state().x, b.state().x);
    }

    #[test]
    fn divergence_halts_without_partial_commit() {
        let mut config = SimulationConfig::default();
        config.step_size = 0.5;
        let mut session = LyapunovSession::new(config).expect("valid");
        session.start().expect("start");

        let mut before = *session.state();
        let mut sums = session.sums();
        let err = loop {
            match session.tick() {
                Ok(_) => {
                    before = *session.state();
                    sums = session.sums();
                }
                Err(err) => break err,
            }
            assert!(session.state().iteration < 100, "never diverged");
        };

        assert_eq!(err.kind(), FailureKind::Diverged);
        assert!(matches!(err, LyapunovError::Diverged { .. }));
        assert_eq!(session.status(), SessionStatus::Halted(FailureKind::Diverged));
        assert_eq!(*session.state(), before);
        assert_eq!(session.sums(), sums);

        assert_eq!(
            session.tick(),
            Err(LyapunovError::Halted(FailureKind::Diverged))
        );
        assert_eq!(
            session.start(),
            Err(LyapunovError::Halted(FailureKind::Diverged))
        );
        session.stop();
        assert_eq!(session.status(), SessionStatus::Halted(FailureKind::Diverged));

        session.reset();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.exponents().iter().all(|e| e.is_finite()));
    }

    #[test]
    fn degenerate_basis_reports_divide_by_zero() {
        let initial = InitialConditions {
            position: Vector3::new(5.2, 8.5, 27.0),
            basis: [Vector3::E1, Vector3::new(2.0, 0.0, 0.0), Vector3::E3],
        };
        let mut session = LyapunovSession::with_flow(
            LorenzParams::default(),
            initial,
            0.01,
            KyOrdering::AsGiven,
        );
        let err = session.tick().expect_err("degenerate basis");
        assert_eq!(err, LyapunovError::DivideByZero { index: 1 });
        assert_eq!(
            session.status(),
            SessionStatus::Halted(FailureKind::DivideByZero)
        );
        assert_eq!(session.state().iteration, 0);
        assert_eq!(session.run(3), Err(LyapunovError::Halted(FailureKind::DivideByZero)));
    }

    #[test]
    fn run_zero_ticks_returns_none() {
        let mut session = LorenzSession::default();
        assert_eq!(session.run(0), Ok(None));
    }

    #[test]
    fn tick_record_serializes_camel_case() {
        let mut session = LorenzSession::default();
        let record = session.tick().expect("tick");
        let json = serde_json::to_value(record).expect("serializes");
        assert!(json.get("orthonormalBasis").is_some());
        assert!(json.get("xPrev").is_some());
        assert_eq!(json["iteration"], 1);
        assert_eq!(json["kyDimension"], serde_json::Value::Null);

        let status = serde_json::to_value(SessionStatus::Halted(FailureKind::Diverged))
            .expect("serializes");
        assert_eq!(status["state"], "halted");
        assert_eq!(status["failure"], "diverged");
    }
}
