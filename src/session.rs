//! Session — one viewer instance and its in-flight loads.
//!
//! DESIGN
//! ======
//! The payload fetch and the image-header probe run as Tokio tasks in a
//! `JoinSet`. Each task resolves to a single [`Completion`]; only the session
//! owner joins them (`next().await` or `pump()`), so every mutation of the
//! `ViewerCore` happens on the owner's thread in completion order. The two
//! completions may arrive in either order; the core renders with placeholder
//! dimensions until the probe lands.
//!
//! A task that panics or is cancelled still settles: its `JoinError` becomes
//! a failed completion of the same kind, so `settle()` always terminates.
//!
//! TEARDOWN
//! ========
//! `teardown()` aborts and detaches outstanding tasks and marks the core torn
//! down. Dropping the session drops the `JoinSet`, which aborts them as well.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use payload::{LoadError, NormalizedPayload};
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};
use viewer::engine::{Action, Event, Scene, ViewerCore};
use viewer::geometry::{DisplayMetrics, ImageDimensions};

use crate::config::{Config, ConfigError, ImageLocations};
use crate::loader::{Loader, ProbeError, Source};

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

/// Result of one background task.
#[derive(Debug, Clone)]
pub enum Completion {
    Payload(Result<NormalizedPayload, LoadError>),
    Image(Result<ImageDimensions, ProbeError>),
}

/// Which completion a background task owes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    Payload,
    Image,
}

impl TaskKind {
    /// The failed completion reported for a task that ended without a result.
    fn failed(self, err: &JoinError) -> Completion {
        match self {
            Self::Payload => Completion::Payload(Err(LoadError::NetworkFailure(format!("payload task failed: {err}")))),
            Self::Image => Completion::Image(Err(ProbeError::Fetch(format!("image probe task failed: {err}")))),
        }
    }
}

/// One viewer plus the background loads feeding it.
pub struct Session {
    core: ViewerCore,
    config: Config,
    loader: Arc<Loader>,
    locations: Option<ImageLocations>,
    tasks: JoinSet<Completion>,
    kinds: HashMap<Id, TaskKind>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("core", &self.core)
            .field("config", &self.config)
            .field("locations", &self.locations)
            .field("pending", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session: build the HTTP client and spawn the payload load.
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn start(config: Config) -> Result<Self, ConfigError> {
        let loader = Arc::new(Loader::new(config.timeouts)?);
        Ok(Self::with_loader(config, loader))
    }

    /// Start a session that shares an existing loader.
    #[must_use]
    pub fn with_loader(config: Config, loader: Arc<Loader>) -> Self {
        let mut session = Self {
            core: ViewerCore::new(config.viewer),
            config,
            loader,
            locations: None,
            tasks: JoinSet::new(),
            kinds: HashMap::new(),
        };
        session.spawn_payload_load();
        session
    }

    // --- Background work ---

    fn track<F>(&mut self, kind: TaskKind, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let handle = self.tasks.spawn(task);
        self.kinds.insert(handle.id(), kind);
    }

    fn spawn_payload_load(&mut self) {
        let loader = Arc::clone(&self.loader);
        let raw = self.config.payload_source.clone();
        info!(source = %raw, "session started; loading payload");

        self.track(TaskKind::Payload, async move {
            let result = match Source::parse(&raw) {
                Ok(source) => loader.load_payload(&source).await,
                Err(err) => Err(err),
            };
            Completion::Payload(result)
        });
    }

    fn spawn_image_probe(&mut self, location: String) {
        let loader = Arc::clone(&self.loader);

        self.track(TaskKind::Image, async move {
            let result = match Source::parse(&location) {
                Ok(source) => loader.probe_image(&source).await,
                Err(err) => Err(ProbeError::Fetch(err.to_string())),
            };
            Completion::Image(result)
        });
    }

    fn settle_task(&mut self, joined: Result<(Id, Completion), JoinError>) -> Completion {
        match joined {
            Ok((id, completion)) => {
                self.kinds.remove(&id);
                completion
            }
            Err(err) => {
                let kind = self.kinds.remove(&err.id()).unwrap_or(TaskKind::Image);
                warn!(error = %err, ?kind, "background task ended without a result");
                kind.failed(&err)
            }
        }
    }

    fn apply(&mut self, completion: Completion) -> Action {
        if self.core.is_torn_down() {
            debug!("session torn down; ignoring late completion");
            return Action::None;
        }
        match completion {
            Completion::Payload(result) => {
                if let Ok(payload) = &result {
                    let locations = self.config.image_locations(&payload.filename);
                    if self.config.probe_image {
                        self.spawn_image_probe(locations.primary.clone());
                    }
                    self.locations = Some(locations);
                }
                self.core.handle(Event::PayloadLoaded(result))
            }
            Completion::Image(Ok(dims)) => self.core.handle(Event::ImageDecoded(dims)),
            Completion::Image(Err(err)) => {
                warn!(error = %err, "image probe failed; keeping placeholder dimensions");
                Action::None
            }
        }
    }

    // --- Draining ---

    /// Wait for the next task to finish and apply its completion. Returns
    /// `None` once nothing is in flight or the session is torn down.
    pub async fn next(&mut self) -> Option<Action> {
        if self.core.is_torn_down() {
            return None;
        }
        let joined = self.tasks.join_next_with_id().await?;
        let completion = self.settle_task(joined);
        Some(self.apply(completion))
    }

    /// Apply every task that has already finished, without waiting.
    pub fn pump(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.core.is_torn_down() {
            return actions;
        }
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            let completion = self.settle_task(joined);
            actions.push(self.apply(completion));
        }
        actions
    }

    /// Drain until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Some(action) = self.next().await {
            actions.push(action);
        }
        actions
    }

    /// Number of background tasks whose completion has not been applied yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    // --- Host reports ---

    pub fn report_layout(&mut self, width: f64, height: f64) -> Action {
        self.core.handle(Event::LayoutChanged(DisplayMetrics::new(width, height)))
    }

    /// The rendering surface decoded the image itself. This and the header
    /// probe report the same fact; whichever lands last wins.
    pub fn report_image_decoded(&mut self, width: u32, height: u32) -> Action {
        self.core.handle(Event::ImageDecoded(ImageDimensions::from((width, height))))
    }

    pub fn begin_gesture(&mut self) -> Action {
        self.core.handle(Event::GestureStarted)
    }

    pub fn commit_gesture(&mut self, position_x: f64, position_y: f64, scale: f64) -> Action {
        self.core.handle(Event::GestureCompleted { position_x, position_y, scale })
    }

    // --- Queries ---

    #[must_use]
    pub fn scene(&self) -> Scene {
        self.core.scene()
    }

    #[must_use]
    pub fn core(&self) -> &ViewerCore {
        &self.core
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Primary and thumbnail locations, known once the payload is ready.
    #[must_use]
    pub fn image_locations(&self) -> Option<&ImageLocations> {
        self.locations.as_ref()
    }

    // --- Teardown ---

    pub fn teardown(&mut self) {
        if self.core.is_torn_down() {
            return;
        }
        self.tasks.abort_all();
        self.tasks.detach_all();
        self.kinds.clear();
        self.core.teardown();
        info!("session torn down");
    }
}
