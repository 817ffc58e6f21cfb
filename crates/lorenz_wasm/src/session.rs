//! Session wrapper driven by the browser's timer and buttons.

use js_sys::Float64Array;
use lorenz_core::analysis::{LorenzSession, SessionStatus};
use lorenz_core::config::AppConfig;
use lorenz_core::playback::Playback;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use std::fmt::Display;
use std::time::Duration;
use wasm_bindgen::prelude::*;

pub(crate) fn js_error(context: &str, err: impl Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

fn serialize<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| js_error("Serialization error", e))
}

#[wasm_bindgen]
pub struct WasmLyapunovSession {
    playback: Playback,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotPayload {
    status: SessionStatus,
    t: f64,
    iteration: u64,
    exponents: [f64; 3],
    exponent_sum: f64,
    ky_dimension: Option<f64>,
}

#[wasm_bindgen]
impl WasmLyapunovSession {
    /// Builds a session from an optional JSON configuration; missing fields
    /// take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WasmLyapunovSession, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(text) => AppConfig::from_json(&text)
                .map_err(|e| js_error("Invalid configuration", format!("{e:#}")))?,
            None => AppConfig::default(),
        };
        let session = LorenzSession::new(config.simulation)
            .map_err(|e| js_error("Invalid configuration", format!("{e:#}")))?;
        let playback = Playback::new(session, config.playback, config.trail)
            .map_err(|e| js_error("Invalid configuration", format!("{e:#}")))?;
        Ok(WasmLyapunovSession { playback })
    }

    /// Runs one tick and returns its record.
    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        let record = self
            .playback
            .step()
            .map_err(|e| js_error("Tick failed", e))?;
        serialize(&record)
    }

    /// Runs `ticks` ticks and returns the last record (or `undefined`).
    pub fn run(&mut self, ticks: u32) -> Result<JsValue, JsValue> {
        let mut last = None;
        for _ in 0..ticks {
            last = Some(
                self.playback
                    .step()
                    .map_err(|e| js_error("Tick failed", e))?,
            );
        }
        serialize(&last)
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.playback
            .start()
            .map_err(|e| js_error("Cannot start", e))
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn toggle(&mut self) -> Result<bool, JsValue> {
        self.playback
            .toggle()
            .map_err(|e| js_error("Cannot start", e))
    }

    pub fn reset(&mut self) {
        self.playback.reset();
    }

    pub fn is_running(&self) -> bool {
        self.playback.is_running()
    }

    /// Feeds elapsed wall-clock milliseconds from `requestAnimationFrame` and
    /// returns the records of the ticks that ran.
    pub fn advance(&mut self, elapsed_ms: f64) -> Result<JsValue, JsValue> {
        let elapsed = Duration::try_from_secs_f64(elapsed_ms / 1000.0)
            .map_err(|e| js_error("Invalid elapsed time", e))?;
        let records = self
            .playback
            .advance(elapsed)
            .map_err(|e| js_error("Tick failed", e))?;
        serialize(&records)
    }

    pub fn status(&self) -> Result<JsValue, JsValue> {
        serialize(&self.playback.session().status())
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let session = self.playback.session();
        let state = session.state();
        serialize(&SnapshotPayload {
            status: session.status(),
            t: state.t,
            iteration: state.iteration,
            exponents: session.exponents(),
            exponent_sum: session.exponent_sum(),
            ky_dimension: session.kaplan_yorke().ok(),
        })
    }

    pub fn time(&self) -> f64 {
        self.playback.session().state().t
    }

    pub fn position(&self) -> Float64Array {
        Float64Array::from(&self.playback.session().state().x.to_array()[..])
    }

    pub fn exponents(&self) -> Float64Array {
        Float64Array::from(&self.playback.session().exponents()[..])
    }

    pub fn ky_dimension(&self) -> Option<f64> {
        self.playback.session().kaplan_yorke().ok()
    }

    /// Trail segments as `[x0, y0, z0, x1, y1, z1, ...]` pairs, oldest first.
    pub fn trail_positions(&self) -> Float64Array {
        Float64Array::from(self.playback.trail().positions().as_slice())
    }

    pub fn set_display(&mut self, name: &str, enabled: bool) -> Result<(), JsValue> {
        self.playback
            .set_display(name, enabled)
            .map_err(|e| js_error("Cannot toggle display", e))
    }

    pub fn displays(&self) -> Result<JsValue, JsValue> {
        serialize(&self.playback.displays())
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::WasmLyapunovSession;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn rejects_invalid_configuration() {
        let result = WasmLyapunovSession::new(Some(
            r#"{ "simulation": { "stepSize": 0.0 } }"#.to_string(),
        ));
        let message = result
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("Step size"), "got \"{message}\"");
    }

    #[wasm_bindgen_test]
    fn ticks_advance_time_and_exponents() {
        let mut session = WasmLyapunovSession::new(None).expect("default session");
        session.run(100).expect("run");
        assert!((session.time() - 1.0).abs() < 1e-9);
        assert_eq!(session.exponents().length(), 3);
        assert_eq!(session.position().length(), 3);
        assert!(session.trail_positions().length() > 0);
    }

    #[wasm_bindgen_test]
    fn timer_only_ticks_while_running() {
        let mut session = WasmLyapunovSession::new(None).expect("default session");
        session.advance(100.0).expect("advance");
        assert_eq!(session.time(), 0.0);
        assert!(session.toggle().expect("toggle"));
        session.advance(20.0).expect("advance");
        assert!(session.time() > 0.0);
        session.stop();
        assert!(!session.is_running());
        assert!(session.advance(-1.0).is_err());
    }

    #[wasm_bindgen_test]
    fn diverging_session_reports_halt() {
        let mut session = WasmLyapunovSession::new(Some(
            r#"{ "simulation": { "stepSize": 0.5 } }"#.to_string(),
        ))
        .expect("valid session");
        let message = session
            .run(100)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("diverged"), "got \"{message}\"");
        assert!(session.start().is_err());
        session.reset();
        assert!(session.start().is_ok());
    }
}
