//! Fixed-cadence playback of a session for interactive front-ends.

use crate::analysis::{LyapunovSession, SessionStatus, TickRecord};
use crate::config::{DisplayToggles, PlaybackConfig, TrailConfig};
use crate::error::LyapunovError;
use crate::lorenz::LorenzParams;
use crate::traits::TangentFlow;
use crate::trajectory::TrajectoryTrail;
use anyhow::{bail, Result};
use std::time::Duration;
use tracing::debug;

impl DisplayToggles {
    /// Sets a toggle by its front-end name.
    pub fn set(&mut self, name: &str, enabled: bool) -> Result<()> {
        match name {
            "trajectory" => self.trajectory = enabled,
            "previous" => self.previous = enabled,
            "current" => self.current = enabled,
            "orthogonal" => self.orthogonal = enabled,
            _ => bail!("Unknown display \"{name}\"."),
        }
        Ok(())
    }
}

/// Drives a session from a wall-clock timer.
///
/// The host reports elapsed time through [`advance`](Self::advance); one tick
/// runs per elapsed `tick_interval_ms` while the session is running. Time
/// owed beyond `max_ticks_per_advance` ticks is dropped rather than replayed
/// later. Every committed tick is offered to the trail.
#[derive(Debug, Clone)]
pub struct Playback<F: TangentFlow = LorenzParams> {
    session: LyapunovSession<F>,
    trail: TrajectoryTrail,
    config: PlaybackConfig,
    pending_ms: f64,
}

impl<F: TangentFlow> Playback<F> {
    pub fn new(
        session: LyapunovSession<F>,
        config: PlaybackConfig,
        trail_config: TrailConfig,
    ) -> Result<Self> {
        config.validate()?;
        trail_config.validate()?;
        let trail = TrajectoryTrail::new(trail_config, session.state().x);
        Ok(Self {
            session,
            trail,
            config,
            pending_ms: 0.0,
        })
    }

    pub fn session(&self) -> &LyapunovSession<F> {
        &self.session
    }

    pub fn trail(&self) -> &TrajectoryTrail {
        &self.trail
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn displays(&self) -> DisplayToggles {
        self.config.displays
    }

    pub fn set_display(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.config.displays.set(name, enabled)?;
        debug!(display = name, enabled, "display toggled");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.session.status() == SessionStatus::Running
    }

    pub fn start(&mut self) -> Result<(), LyapunovError> {
        self.pending_ms = 0.0;
        self.session.start()
    }

    /// Takes effect before the next scheduled tick.
    pub fn stop(&mut self) {
        self.pending_ms = 0.0;
        self.session.stop();
    }

    /// Starts a stopped session or stops a running one. Returns whether it is
    /// now running.
    pub fn toggle(&mut self) -> Result<bool, LyapunovError> {
        if self.is_running() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.is_running())
    }

    /// Runs a single tick regardless of the timer.
    pub fn step(&mut self) -> Result<TickRecord, LyapunovError> {
        let record = self.session.tick()?;
        self.trail.push(record.x);
        Ok(record)
    }

    /// Accounts for `elapsed` wall-clock time and runs the ticks that fell due.
    ///
    /// Does nothing unless the session is running. Stops at the first failed
    /// tick; the session is then halted and the error is returned.
    pub fn advance(&mut self, elapsed: Duration) -> Result<Vec<TickRecord>, LyapunovError> {
        if !self.is_running() {
            return Ok(Vec::new());
        }
        self.pending_ms += elapsed.as_secs_f64() * 1000.0;
        let interval = self.config.tick_interval_ms;
        let due = (self.pending_ms / interval).floor();
        self.pending_ms -= due * interval;
        let ticks = due.min(f64::from(self.config.max_ticks_per_advance)) as usize;

        let mut records = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            match self.step() {
                Ok(record) => records.push(record),
                Err(err) => {
                    self.pending_ms = 0.0;
                    return Err(err);
                }
            }
        }
        Ok(records)
    }

    /// Resets the session and clears the trail.
    pub fn reset(&mut self) {
        self.session.reset();
        self.pending_ms = 0.0;
        self.trail.clear(self.session.state().x);
    }
}
