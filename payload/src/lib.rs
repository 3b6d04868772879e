//! Inference payload model and normalization.
//!
//! This crate owns the raw inference document produced by the detection
//! service. It validates the document, turns positional detection rows into
//! named [`Detection`] records, and derives the small set of presentation facts
//! the viewer shows next to the slide (unique categories, speed class, patient
//! metadata). Every other crate receives only the immutable
//! [`NormalizedPayload`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Execution times strictly below this are classified [`SpeedClass::Fast`].
pub const FAST_BELOW_MS: f64 = 3000.0;
/// Execution times strictly below this (and not fast) are [`SpeedClass::Moderate`].
pub const MODERATE_BELOW_MS: f64 = 7000.0;

/// Error returned when a payload cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The payload source could not be reached or read.
    #[error("payload source unreachable: {0}")]
    NetworkFailure(String),
    /// The payload bytes are not a JSON document.
    #[error("payload is not valid JSON: {0}")]
    ParseFailure(String),
    /// The document is JSON but lacks required fields or has the wrong types.
    #[error("payload does not match the inference schema: {0}")]
    SchemaMismatch(String),
}

impl LoadError {
    /// The error category without its detail string.
    #[must_use]
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::NetworkFailure(_) => LoadErrorKind::NetworkFailure,
            Self::ParseFailure(_) => LoadErrorKind::ParseFailure,
            Self::SchemaMismatch(_) => LoadErrorKind::SchemaMismatch,
        }
    }
}

/// Detail-free category of a [`LoadError`], suitable for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    NetworkFailure,
    ParseFailure,
    SchemaMismatch,
}

/// Axis-aligned box in native image pixels.
///
/// `min_x <= max_x` and `min_y <= max_y` are expected but not enforced; an
/// inverted box is kept as-is and renders as a zero or negative-size region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether the box has zero or negative area.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
}

/// One detected region, in native image pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bounds: Bounds,
    /// Category label; `None` when the row carried no usable label.
    pub category: Option<String>,
    /// Model confidence, when the row carries one.
    pub confidence: Option<f64>,
}

impl Detection {
    /// Build a detection from a positional `[min_x, min_y, max_x, max_y, category, confidence?, ...]` row.
    fn from_row(index: usize, row: &[Value]) -> Result<Self, LoadError> {
        if row.len() < 4 {
            return Err(LoadError::SchemaMismatch(format!(
                "detection {index} has {} fields, expected at least 4",
                row.len()
            )));
        }
        let coord = |i: usize| {
            row[i].as_f64().ok_or_else(|| {
                LoadError::SchemaMismatch(format!("detection {index}: coordinate {i} is not a number"))
            })
        };
        let bounds = Bounds::new(coord(0)?, coord(1)?, coord(2)?, coord(3)?);

        let category = match row.get(4) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(LoadError::SchemaMismatch(format!(
                    "detection {index}: category must be a string, got {other}"
                )));
            }
        };
        let confidence = row.get(5).and_then(Value::as_f64);

        if bounds.width() < 0.0 || bounds.height() < 0.0 {
            warn!(index, ?bounds, "detection has inverted bounds");
        }

        Ok(Self { bounds, category, confidence })
    }
}

/// Coarse classification of the model's execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedClass {
    Fast,
    Moderate,
    Slow,
}

impl SpeedClass {
    /// Classify an execution time in milliseconds. Boundaries belong to the slower class.
    #[must_use]
    pub fn from_execution_ms(ms: f64) -> Self {
        if ms < FAST_BELOW_MS {
            Self::Fast
        } else if ms < MODERATE_BELOW_MS {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast",
            Self::Moderate => "Moderate",
            Self::Slow => "Slow",
        }
    }
}

/// Patient and sample strings shown alongside the slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub patient_id: String,
    pub date: String,
    pub sample_type: String,
    /// Processing status reported by the inference pipeline.
    pub status: String,
}

/// Validated, immutable view of an inference document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPayload {
    /// Image filename, relative to the configured image bases.
    pub filename: String,
    pub metadata: Metadata,
    pub execution_time_ms: f64,
    pub detections: Vec<Detection>,
    /// Distinct category labels in order of first appearance.
    pub unique_categories: Vec<String>,
    pub speed_class: SpeedClass,
}

impl NormalizedPayload {
    /// Unique categories joined for a single display line, e.g. `"A+, O-"`.
    #[must_use]
    pub fn category_summary(&self) -> String {
        self.unique_categories.join(", ")
    }
}

// --- Raw document shape ---

#[derive(Deserialize)]
struct RawDocument {
    patient_id: String,
    inference_results: RawInference,
}

#[derive(Deserialize)]
struct RawInference {
    date: String,
    sample_type: String,
    celery_status: String,
    filename: String,
    output: RawOutput,
}

#[derive(Deserialize)]
struct RawOutput {
    #[serde(rename = "executionTime")]
    execution_time: f64,
    detection_results: Vec<Vec<Value>>,
}

/// Parse and normalize a payload from raw bytes.
///
/// # Errors
///
/// Returns [`LoadError::ParseFailure`] when the bytes are not JSON and
/// [`LoadError::SchemaMismatch`] when the document lacks required fields.
pub fn parse_payload(bytes: &[u8]) -> Result<NormalizedPayload, LoadError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| LoadError::ParseFailure(e.to_string()))?;
    normalize(value)
}

/// Normalize an already-parsed JSON document.
///
/// # Errors
///
/// Returns [`LoadError::SchemaMismatch`] when required fields are missing or
/// have the wrong type, including malformed detection rows.
pub fn normalize(value: Value) -> Result<NormalizedPayload, LoadError> {
    let raw: RawDocument = serde_json::from_value(value).map_err(|e| LoadError::SchemaMismatch(e.to_string()))?;
    let RawDocument { patient_id, inference_results } = raw;
    let RawInference { date, sample_type, celery_status, filename, output } = inference_results;

    let detections = output
        .detection_results
        .iter()
        .enumerate()
        .map(|(index, row)| Detection::from_row(index, row))
        .collect::<Result<Vec<_>, _>>()?;

    let unique_categories = unique_categories(&detections);
    let speed_class = SpeedClass::from_execution_ms(output.execution_time);

    debug!(
        detections = detections.len(),
        categories = unique_categories.len(),
        speed = speed_class.label(),
        "payload normalized"
    );

    Ok(NormalizedPayload {
        filename,
        metadata: Metadata { patient_id, date, sample_type, status: celery_status },
        execution_time_ms: output.execution_time,
        detections,
        unique_categories,
        speed_class,
    })
}

/// Distinct category labels in order of first appearance (exact string equality).
#[must_use]
pub fn unique_categories(detections: &[Detection]) -> Vec<String> {
    let mut seen = HashSet::new();
    detections
        .iter()
        .filter_map(|d| d.category.as_deref())
        .filter(|c| seen.insert(*c))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
