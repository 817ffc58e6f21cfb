//! WASM bridge exposing Lorenz Lyapunov sessions to the browser.

pub mod analysis;
pub mod session;

pub use session::WasmLyapunovSession;
