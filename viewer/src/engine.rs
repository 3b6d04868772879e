use std::sync::Arc;

use payload::{LoadError, LoadErrorKind, NormalizedPayload};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_INDICATOR_MIN_HEIGHT, DEFAULT_INDICATOR_MIN_WIDTH};
use crate::geometry::{
    DisplayMetrics, ImageDimensions, MinimapGeometry, Point, Rect, ScaleFactors, ViewState, compute_indicator_rect,
    scale_factors,
};
use crate::overlay::{DisplayedBox, hit_test, map_detections};
use crate::viewport::{GestureState, ViewportTracker};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Fixed sizing for one viewer instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    /// Displayed size of the primary image at scale 1.
    pub base: DisplayMetrics,
    pub minimap: MinimapGeometry,
    /// Indicator size floor, in minimap pixels.
    pub indicator_min_width: f64,
    pub indicator_min_height: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base: DisplayMetrics::default(),
            minimap: MinimapGeometry::default(),
            indicator_min_width: DEFAULT_INDICATOR_MIN_WIDTH,
            indicator_min_height: DEFAULT_INDICATOR_MIN_HEIGHT,
        }
    }
}

/// Inputs reported by the host, in whatever order they happen.
#[derive(Debug, Clone)]
pub enum Event {
    /// The one-shot payload load finished.
    PayloadLoaded(Result<NormalizedPayload, LoadError>),
    /// The primary image decoded and its natural size is known.
    ImageDecoded(ImageDimensions),
    /// The primary image was laid out at a new on-screen size.
    LayoutChanged(DisplayMetrics),
    /// A pan or zoom gesture started.
    GestureStarted,
    /// A pan or zoom gesture ended with this transform.
    GestureCompleted { position_x: f64, position_y: f64, scale: f64 },
}

/// What the host should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    /// Inputs changed; fetch a fresh [`Scene`] and repaint.
    RenderNeeded,
    /// The payload load failed. Reported once; the session stays on the placeholder.
    LoadFailed(LoadError),
}

/// Load status shown by the viewer chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum ViewerStatus {
    Loading,
    Ready,
    Failed(LoadErrorKind),
}

/// Everything a renderer needs for one paint pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub status: ViewerStatus,
    /// Overlay boxes in displayed space. Empty unless the payload is ready.
    pub boxes: Vec<DisplayedBox>,
    /// Viewport rectangle in minimap space.
    pub indicator: Rect,
    pub view: ViewState,
    pub display: DisplayMetrics,
    pub scale: ScaleFactors,
}

#[derive(Debug, Clone)]
enum PayloadSlot {
    Pending,
    Ready(Arc<NormalizedPayload>),
    Failed(LoadError),
}

/// Viewer state driven by host events.
///
/// Holds the latest snapshot of each input (payload, natural image size,
/// layout size, committed transform) and recomputes derived geometry from
/// them on demand. After [`ViewerCore::teardown`] every event is ignored.
#[derive(Debug)]
pub struct ViewerCore {
    config: ViewerConfig,
    payload: PayloadSlot,
    natural: Option<ImageDimensions>,
    display: DisplayMetrics,
    tracker: ViewportTracker,
    torn_down: bool,
}

impl Default for ViewerCore {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl ViewerCore {
    #[must_use]
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            payload: PayloadSlot::Pending,
            natural: None,
            display: config.base,
            tracker: ViewportTracker::new(config.base),
            torn_down: false,
        }
    }

    // --- Inputs ---

    /// Apply one host event.
    pub fn handle(&mut self, event: Event) -> Action {
        if self.torn_down {
            debug!(?event, "viewer torn down; ignoring event");
            return Action::None;
        }
        match event {
            Event::PayloadLoaded(result) => self.apply_payload(result),
            Event::ImageDecoded(dims) => {
                if dims.is_degenerate() {
                    warn!(width = dims.width, height = dims.height, "decoded image has degenerate size");
                }
                self.natural = Some(dims);
                Action::RenderNeeded
            }
            Event::LayoutChanged(metrics) => {
                self.display = metrics;
                Action::RenderNeeded
            }
            Event::GestureStarted => {
                self.tracker.begin_gesture();
                Action::None
            }
            Event::GestureCompleted { position_x, position_y, scale } => {
                self.tracker.complete_gesture(position_x, position_y, scale);
                Action::RenderNeeded
            }
        }
    }

    fn apply_payload(&mut self, result: Result<NormalizedPayload, LoadError>) -> Action {
        if !matches!(self.payload, PayloadSlot::Pending) {
            warn!("payload already settled for this session; ignoring");
            return Action::None;
        }
        match result {
            Ok(payload) => {
                self.payload = PayloadSlot::Ready(Arc::new(payload));
                Action::RenderNeeded
            }
            Err(err) => {
                info!(error = %err, "payload load failed; viewer stays on placeholder");
                self.payload = PayloadSlot::Failed(err.clone());
                Action::LoadFailed(err)
            }
        }
    }

    /// Stop accepting events. Late completions become no-ops.
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    // --- Queries ---

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[must_use]
    pub fn config(&self) -> ViewerConfig {
        self.config
    }

    #[must_use]
    pub fn status(&self) -> ViewerStatus {
        match &self.payload {
            PayloadSlot::Pending => ViewerStatus::Loading,
            PayloadSlot::Ready(_) => ViewerStatus::Ready,
            PayloadSlot::Failed(err) => ViewerStatus::Failed(err.kind()),
        }
    }

    /// The normalized payload, once loaded.
    #[must_use]
    pub fn payload(&self) -> Option<Arc<NormalizedPayload>> {
        match &self.payload {
            PayloadSlot::Ready(payload) => Some(Arc::clone(payload)),
            PayloadSlot::Pending | PayloadSlot::Failed(_) => None,
        }
    }

    /// The load error, if the load failed.
    #[must_use]
    pub fn load_error(&self) -> Option<&LoadError> {
        match &self.payload {
            PayloadSlot::Failed(err) => Some(err),
            PayloadSlot::Pending | PayloadSlot::Ready(_) => None,
        }
    }

    /// Natural image size, or the base displayed size as a placeholder until the image decodes.
    #[must_use]
    pub fn image_dimensions(&self) -> ImageDimensions {
        self.natural
            .unwrap_or(ImageDimensions::new(self.config.base.width, self.config.base.height))
    }

    #[must_use]
    pub fn display_metrics(&self) -> DisplayMetrics {
        self.display
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        self.tracker.view_state()
    }

    #[must_use]
    pub fn gesture_state(&self) -> GestureState {
        self.tracker.gesture_state()
    }

    #[must_use]
    pub fn scale_factors(&self) -> ScaleFactors {
        scale_factors(self.image_dimensions(), self.display)
    }

    /// Overlay boxes for the current inputs; empty until the payload is ready.
    #[must_use]
    pub fn displayed_boxes(&self) -> Vec<DisplayedBox> {
        match &self.payload {
            PayloadSlot::Ready(payload) => map_detections(&payload.detections, self.scale_factors()),
            PayloadSlot::Pending | PayloadSlot::Failed(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn indicator_rect(&self) -> Rect {
        compute_indicator_rect(
            &self.tracker.view_state(),
            self.display,
            self.config.minimap,
            self.config.indicator_min_width,
            self.config.indicator_min_height,
        )
    }

    /// Index of the detection under a screen-space point (pan/zoom applied), if any.
    #[must_use]
    pub fn detection_at(&self, screen: Point) -> Option<usize> {
        let displayed = self.tracker.view_state().screen_to_displayed(screen);
        hit_test(&self.displayed_boxes(), displayed)
    }

    /// Build an immutable snapshot for one render pass.
    #[must_use]
    pub fn scene(&self) -> Scene {
        Scene {
            status: self.status(),
            boxes: self.displayed_boxes(),
            indicator: self.indicator_rect(),
            view: self.tracker.view_state(),
            display: self.display,
            scale: self.scale_factors(),
        }
    }
}
