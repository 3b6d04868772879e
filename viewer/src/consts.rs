//! Shared numeric constants for the viewer crate.

// ── Primary view ────────────────────────────────────────────────

/// Width of the primary image at scale 1, in CSS pixels.
pub const DEFAULT_BASE_WIDTH: f64 = 800.0;

/// Height of the primary image at scale 1, in CSS pixels.
pub const DEFAULT_BASE_HEIGHT: f64 = 500.0;

/// Smallest scale a committed transform may carry. Out-of-range scales clamp here.
pub const MIN_VIEW_SCALE: f64 = 0.01;

// ── Minimap ─────────────────────────────────────────────────────

/// Minimap canvas width in pixels.
pub const DEFAULT_MINIMAP_WIDTH: f64 = 200.0;

/// Minimap canvas height in pixels.
pub const DEFAULT_MINIMAP_HEIGHT: f64 = 125.0;

/// Indicator width floor so the viewport rectangle stays visible at high zoom.
pub const DEFAULT_INDICATOR_MIN_WIDTH: f64 = 50.0;

/// Indicator height floor.
pub const DEFAULT_INDICATOR_MIN_HEIGHT: f64 = 30.0;
