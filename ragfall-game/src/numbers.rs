//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn floor_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.min(max).floor();
    cast::<f64, u64>(clamped).unwrap_or(u64::MAX)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Widen a f32 to f64, returning 0.0 for non-finite values.
#[must_use]
pub fn finite_f32_to_f64(value: f32) -> f64 {
    if value.is_finite() {
        f64::from(value)
    } else {
        0.0
    }
}

/// Clamp a f64 to the f32 range and downcast, returning 0.0 for non-finite values.
#[must_use]
pub fn clamp_f64_to_f32(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let min = cast::<f32, f64>(f32::MIN).unwrap_or(f64::MIN);
    let max = cast::<f32, f64>(f32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max);
    cast::<f64, f32>(clamped).unwrap_or(0.0)
}
