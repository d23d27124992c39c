//! Rendering of metric values.
//!
//! An empty string means "no qualifying rows" and becomes `Null` downstream.

/// Fixed-point rendering with `decimals` places. Non-finite values render empty.
pub fn fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return String::new();
    }
    // Avoid printing "-0.000".
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}

pub fn fixed_or_empty(value: Option<f64>, decimals: usize) -> String {
    value.map(|x| fixed(x, decimals)).unwrap_or_default()
}

/// Intensities switch to whole numbers once they grow past 100.
pub fn intensity(value: f64) -> String {
    if value.abs() > 100.0 {
        fixed(value, 0)
    } else {
        fixed(value, 1)
    }
}

pub fn count(value: usize) -> String {
    value.to_string()
}
