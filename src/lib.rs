//! slidescope — host glue for the slide viewer.
//!
//! DESIGN
//! ======
//! The `payload` crate normalizes the inference document and the `viewer`
//! crate owns all coordinate math. This crate wires them to the outside world:
//! it reads configuration from the environment, loads the payload from disk or
//! over HTTP, probes the primary image header for its natural size, and runs a
//! [`Session`] that feeds those completions into one `ViewerCore`.
//!
//! Nothing here installs a tracing subscriber; the embedding host owns that.

pub mod config;
pub mod loader;
pub mod session;

pub use config::{Config, ConfigError, ImageLocations, Timeouts};
pub use loader::{Loader, ProbeError, Source, probe_dimensions};
pub use payload::{Detection, LoadError, LoadErrorKind, Metadata, NormalizedPayload, SpeedClass};
pub use session::{Completion, Session};
pub use viewer::engine::{Action, Scene, ViewerConfig, ViewerStatus};
