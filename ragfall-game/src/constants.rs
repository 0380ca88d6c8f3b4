//! Centralized balance and tuning constants for Ragfall game logic.
//!
//! These values are the defaults behind [`crate::TuningConfig`]. Keeping them
//! together means balance changes land in one reviewed place even when a
//! tuning file overrides them at runtime.

// Combo input -------------------------------------------------------------
pub const COMBO_WINDOW_MS: u64 = 1_000;
pub const COMBO_CAPACITY: usize = 6;

// Fall tracking -----------------------------------------------------------
/// Downward velocity (y grows downward) above which the body counts as falling.
pub const FALL_VELOCITY_THRESHOLD: f32 = 0.5;
pub const NEAR_GROUND_THRESHOLD: f32 = 5.0;
pub const GROUND_PROXIMITY_BAND: f32 = 50.0;
/// World position units (pixels) per meter of fall height.
pub const HEIGHT_UNITS_PER_METER: f32 = 50.0;

// Impact scoring ----------------------------------------------------------
pub const IMPACT_HEIGHT_SCALE: f64 = 10.0;
pub const SCORE_HEIGHT_DIVISOR: f64 = 50.0;
pub const BASE_STUNT_MULTIPLIER: f64 = 1.0;

// Level flow --------------------------------------------------------------
pub const LEVEL_COMPLETE_DELAY_MS: u64 = 3_000;
pub const SCORE_EASING_RATE: f32 = 6.0;

// High scores -------------------------------------------------------------
pub const HIGH_SCORE_SLOTS: usize = 5;
pub const HIGH_SCORE_FILE_NAME: &str = "ragfall-highscores.json";
