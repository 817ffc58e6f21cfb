//! Stateless numerical helpers for front-end tables.

use crate::session::js_error;
use js_sys::Float64Array;
use lorenz_core::analysis::{kaplan_yorke, KyOrdering};
use lorenz_core::gram_schmidt::gram_schmidt;
use lorenz_core::vector::Vector3;
use wasm_bindgen::prelude::*;

/// Kaplan-Yorke dimension of an exponent spectrum. Rejects spectra for which
/// the dimension is undefined.
#[wasm_bindgen]
pub fn kaplan_yorke_dimension(
    exponents: Vec<f64>,
    sort_descending: bool,
) -> Result<f64, JsValue> {
    let ordering = if sort_descending {
        KyOrdering::SortDescending
    } else {
        KyOrdering::AsGiven
    };
    kaplan_yorke(&exponents, ordering)
        .map_err(|e| js_error("Kaplan-Yorke dimension undefined", e))
}

/// Gram-Schmidt over vectors packed as `[x0, y0, z0, x1, y1, z1, ...]`.
#[wasm_bindgen]
pub fn orthogonalize(packed: Vec<f64>, normalise: bool) -> Result<Float64Array, JsValue> {
    if packed.len() % 3 != 0 {
        return Err(JsValue::from_str(&format!(
            "Packed vectors must have a multiple of 3 values, got {}.",
            packed.len()
        )));
    }
    let vectors: Vec<Vector3> = packed
        .chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect();
    let out =
        gram_schmidt(&vectors, normalise).map_err(|e| js_error("Gram-Schmidt failed", e))?;
    let flat: Vec<f64> = out.iter().flat_map(|v| v.to_array()).collect();
    Ok(Float64Array::from(flat.as_slice()))
}
