//! Coordinate engine for the slide viewer.
//!
//! This crate keeps four coordinate spaces consistent: native image pixels
//! (where detections live), the displayed space of the image scaled into its
//! container, the pan/zoom transform applied on top of that, and the fixed-size
//! minimap. It has no I/O and no rendering; a host feeds it completions and
//! layout reports through [`engine::ViewerCore`] and paints the
//! [`engine::Scene`] it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Event-driven [`engine::ViewerCore`] and per-pass [`engine::Scene`] snapshots |
//! | [`geometry`] | Pure coordinate math: scale factors, rect mapping, minimap indicator |
//! | [`overlay`] | Detection → displayed-box mapping and hit-testing |
//! | [`viewport`] | Pan/zoom gesture tracker |
//! | [`consts`] | Default sizes and transform limits |

pub mod consts;
pub mod engine;
pub mod geometry;
pub mod overlay;
pub mod viewport;
