//! Session, playback and trail configuration.
//!
//! Every section deserializes with defaults for missing fields, so a JSON
//! document only needs to name what it overrides:
//!
//! ```json
//! { "simulation": { "stepSize": 0.005, "params": { "rho": 99.96 } } }
//! ```

use crate::analysis::KyOrdering;
use crate::lorenz::LorenzParams;
use crate::vector::Vector3;
use anyhow::{bail, Context, Result};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Smallest |det| of the initial basis accepted as linearly independent.
const MIN_BASIS_DETERMINANT: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitialConditions {
    pub position: Vector3,
    pub basis: [Vector3; 3],
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            position: Vector3::new(5.2, 8.5, 27.0),
            basis: Vector3::standard_basis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub params: LorenzParams,
    pub step_size: f64,
    pub initial: InitialConditions,
    pub ky_ordering: KyOrdering,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            params: LorenzParams::default(),
            step_size: 0.01,
            initial: InitialConditions::default(),
            ky_ordering: KyOrdering::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.params.is_finite() {
            bail!("Lorenz parameters must be finite.");
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            bail!("Step size must be positive and finite, got {}.", self.step_size);
        }
        if !self.initial.position.is_finite() {
            bail!("Initial position must be finite.");
        }
        if self.initial.basis.iter().any(|v| !v.is_finite()) {
            bail!("Initial basis must be finite.");
        }
        let [a, b, c] = self.initial.basis;
        let det = Matrix3::from_columns(&[
            nalgebra::Vector3::from(a),
            nalgebra::Vector3::from(b),
            nalgebra::Vector3::from(c),
        ])
        .determinant();
        if det.abs() < MIN_BASIS_DETERMINANT {
            bail!("Initial basis is linearly dependent (determinant {det:e}).");
        }
        Ok(())
    }
}

/// Which overlays the front-end draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayToggles {
    pub trajectory: bool,
    pub previous: bool,
    pub current: bool,
    pub orthogonal: bool,
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            trajectory: true,
            previous: true,
            current: true,
            orthogonal: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Wall-clock time between ticks. Independent of the simulated step size.
    pub tick_interval_ms: f64,
    /// Upper bound on ticks run by a single `advance` call.
    pub max_ticks_per_advance: u32,
    pub displays: DisplayToggles,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000.0 / 60.0,
            max_ticks_per_advance: 8,
            displays: DisplayToggles::default(),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tick_interval_ms.is_finite() || self.tick_interval_ms <= 0.0 {
            bail!(
                "Tick interval must be positive and finite, got {} ms.",
                self.tick_interval_ms
            );
        }
        if self.max_ticks_per_advance == 0 {
            bail!("max_ticks_per_advance must be at least 1.");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrailConfig {
    /// Segments retained before the oldest is dropped.
    pub max_segments: usize,
    /// A new segment is only appended once the trajectory has moved further
    /// than this from the last drawn point.
    pub min_redraw_distance: f64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_segments: 1500,
            min_redraw_distance: 0.4,
        }
    }
}

impl TrailConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_segments == 0 {
            bail!("Trail must retain at least one segment.");
        }
        if !self.min_redraw_distance.is_finite() || self.min_redraw_distance < 0.0 {
            bail!(
                "Minimum redraw distance must be non-negative, got {}.",
                self.min_redraw_distance
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub playback: PlaybackConfig,
    pub trail: TrailConfig,
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(text).context("Failed to parse configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation
            .validate()
            .context("Invalid simulation configuration")?;
        self.playback
            .validate()
            .context("Invalid playback configuration")?;
        self.trail.validate().context("Invalid trail configuration")?;
        Ok(())
    }
}
