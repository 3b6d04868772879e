//! Pan/zoom tracking for the primary view.
//!
//! The rendering surface runs the actual gesture; this tracker only records
//! whether one is in progress and the transform each completed gesture
//! commits. A commit always replaces the whole [`ViewState`]; there are no
//! partial updates and no intermediate states are kept.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use tracing::warn;

use crate::geometry::{DisplayMetrics, ViewState};

/// Whether a pan or zoom gesture is currently running on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A pan or zoom started and has not been committed yet.
    Adjusting,
}

/// Holds the committed view transform.
#[derive(Debug, Clone)]
pub struct ViewportTracker {
    base: DisplayMetrics,
    gesture: GestureState,
    view: ViewState,
}

impl ViewportTracker {
    /// Create a tracker at the identity transform. `base` is the displayed
    /// size of the primary image at scale 1.
    #[must_use]
    pub fn new(base: DisplayMetrics) -> Self {
        Self { base, gesture: GestureState::Idle, view: ViewState::identity(base) }
    }

    /// Mark a gesture as started.
    pub fn begin_gesture(&mut self) {
        self.gesture = GestureState::Adjusting;
    }

    /// Record a new transform, replacing the previous one wholesale.
    ///
    /// An out-of-range transform is clamped (minimum positive scale, finite
    /// offsets) rather than rejected, so the tracker always holds a usable state.
    pub fn update_view_state(&mut self, position_x: f64, position_y: f64, scale: f64) -> ViewState {
        self.view = match ViewState::try_new(position_x, position_y, scale, self.base) {
            Ok(view) => view,
            Err(err) => {
                warn!(error = %err, "clamping out-of-range transform");
                ViewState::clamped(position_x, position_y, scale, self.base)
            }
        };
        self.view
    }

    /// Commit the transform reported at the end of a gesture and return to idle.
    pub fn complete_gesture(&mut self, position_x: f64, position_y: f64, scale: f64) -> ViewState {
        self.gesture = GestureState::Idle;
        self.update_view_state(position_x, position_y, scale)
    }

    /// Return to the identity transform.
    pub fn reset(&mut self) {
        self.gesture = GestureState::Idle;
        self.view = ViewState::identity(self.base);
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.view
    }

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.gesture
    }

    #[must_use]
    pub fn base(&self) -> DisplayMetrics {
        self.base
    }
}

impl Default for ViewportTracker {
    fn default() -> Self {
        Self::new(DisplayMetrics::default())
    }
}
