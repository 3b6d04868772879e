//! Pure coordinate math shared by the overlay and the minimap.
//!
//! Four spaces are involved:
//!
//! - **native**: pixels of the undisplayed image, where detections live;
//! - **displayed**: the image as laid out in its container, before pan/zoom;
//! - **screen**: displayed space after the user's pan/zoom transform;
//! - **minimap**: the fixed-size overview canvas.
//!
//! Nothing here fails. Division-by-zero conditions fall back to safe defaults
//! so a half-initialised viewer still produces finite output.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::Serialize;

pub use payload::Bounds;

use crate::consts::{
    DEFAULT_BASE_HEIGHT, DEFAULT_BASE_WIDTH, DEFAULT_MINIMAP_HEIGHT, DEFAULT_MINIMAP_WIDTH, MIN_VIEW_SCALE,
};

/// Error raised when a transform cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Scale must be finite and strictly positive; offsets must be finite.
    #[error("out-of-range transform: offset ({offset_x}, {offset_y}), scale {scale}")]
    OutOfRangeTransform { offset_x: f64, offset_y: f64, scale: f64 },
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// A point in displayed, screen, or minimap space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Natural size of the image in native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

impl ImageDimensions {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether either axis is zero, negative, or not finite.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(positive(self.width) && positive(self.height))
    }
}

impl From<(u32, u32)> for ImageDimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width: f64::from(width), height: f64::from(height) }
    }
}

/// On-screen size of the primary image as currently laid out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayMetrics {
    pub width: f64,
    pub height: f64,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self { width: DEFAULT_BASE_WIDTH, height: DEFAULT_BASE_HEIGHT }
    }
}

impl DisplayMetrics {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether either axis is zero, negative, or not finite.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(positive(self.width) && positive(self.height))
    }
}

/// Native → displayed scale ratios per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Fixed size of the minimap canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinimapGeometry {
    pub width: f64,
    pub height: f64,
}

impl Default for MinimapGeometry {
    fn default() -> Self {
        Self { width: DEFAULT_MINIMAP_WIDTH, height: DEFAULT_MINIMAP_HEIGHT }
    }
}

impl MinimapGeometry {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Committed pan/zoom transform of the primary image.
///
/// `offset_x` / `offset_y` are in screen pixels, `scale` is the zoom factor
/// (1.0 = fit). `view_width` / `view_height` are the base displayed size divided
/// by `scale`: how much of the image, measured at scale 1, is in view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub view_width: f64,
    pub view_height: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::identity(DisplayMetrics::default())
    }
}

impl ViewState {
    /// Untransformed view: no pan, scale 1.
    #[must_use]
    pub fn identity(base: DisplayMetrics) -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: 1.0, view_width: base.width, view_height: base.height }
    }

    /// Build a view state, rejecting a non-positive or non-finite scale and non-finite offsets.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::OutOfRangeTransform`] for unrepresentable input.
    pub fn try_new(offset_x: f64, offset_y: f64, scale: f64, base: DisplayMetrics) -> Result<Self, GeometryError> {
        if !positive(scale) || !offset_x.is_finite() || !offset_y.is_finite() {
            return Err(GeometryError::OutOfRangeTransform { offset_x, offset_y, scale });
        }
        Ok(Self::derive(offset_x, offset_y, scale, base))
    }

    /// Build a view state, forcing input into range: scale is at least
    /// [`MIN_VIEW_SCALE`] and non-finite offsets become 0.
    #[must_use]
    pub fn clamped(offset_x: f64, offset_y: f64, scale: f64, base: DisplayMetrics) -> Self {
        let scale = if scale.is_finite() { scale.max(MIN_VIEW_SCALE) } else { MIN_VIEW_SCALE };
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self::derive(finite_or_zero(offset_x), finite_or_zero(offset_y), scale, base)
    }

    fn derive(offset_x: f64, offset_y: f64, scale: f64, base: DisplayMetrics) -> Self {
        Self { offset_x, offset_y, scale, view_width: base.width / scale, view_height: base.height / scale }
    }

    /// Convert a screen-space point into displayed space.
    #[must_use]
    pub fn screen_to_displayed(&self, screen: Point) -> Point {
        Point { x: (screen.x - self.offset_x) / self.scale, y: (screen.y - self.offset_y) / self.scale }
    }

    /// Convert a displayed-space point into screen space.
    #[must_use]
    pub fn displayed_to_screen(&self, displayed: Point) -> Point {
        Point { x: displayed.x * self.scale + self.offset_x, y: displayed.y * self.scale + self.offset_y }
    }
}

/// Displayed/native ratio per axis.
///
/// Degenerate input (a zero, negative, or non-finite axis on either side)
/// yields [`ScaleFactors::IDENTITY`] instead of dividing by zero.
#[must_use]
pub fn scale_factors(native: ImageDimensions, displayed: DisplayMetrics) -> ScaleFactors {
    if native.is_degenerate() || displayed.is_degenerate() {
        return ScaleFactors::IDENTITY;
    }
    ScaleFactors { x: displayed.width / native.width, y: displayed.height / native.height }
}

/// Scale all four coordinates of `bounds` componentwise. Inverted boxes pass through unchanged in shape.
#[must_use]
pub fn map_rect(bounds: Bounds, scale: ScaleFactors) -> Bounds {
    Bounds {
        min_x: bounds.min_x * scale.x,
        min_y: bounds.min_y * scale.y,
        max_x: bounds.max_x * scale.x,
        max_y: bounds.max_y * scale.y,
    }
}

/// Position of the minimap rectangle marking the region currently in view.
///
/// Both size and position use the live `display` size as their denominator.
/// The result always lies inside the minimap: size is floored at
/// `min_width` × `min_height` and capped at the minimap size, and the position
/// is clamped so the rectangle never leaves the canvas.
#[must_use]
pub fn compute_indicator_rect(
    view: &ViewState,
    display: DisplayMetrics,
    minimap: MinimapGeometry,
    min_width: f64,
    min_height: f64,
) -> Rect {
    let scale = if positive(view.scale) { view.scale } else { MIN_VIEW_SCALE };
    let (x, width) = indicator_axis(display.width, view.offset_x, scale, minimap.width, min_width);
    let (y, height) = indicator_axis(display.height, view.offset_y, scale, minimap.height, min_height);
    Rect { x, y, width, height }
}

/// One axis of the indicator: returns `(position, size)` in minimap pixels.
fn indicator_axis(displayed: f64, offset: f64, scale: f64, extent: f64, floor: f64) -> (f64, f64) {
    let extent = extent.max(0.0);

    let in_view = displayed / scale;
    let visible_fraction = if positive(displayed) { in_view / displayed } else { 1.0 / scale };
    let size = (visible_fraction * extent).max(floor).min(extent);

    let span = displayed * scale;
    let raw_position = if positive(span) { (-offset / span) * extent } else { 0.0 };
    let position = raw_position.min(extent - size).max(0.0);

    (position, size)
}
