//! Lifecycle state detection.
//!
//! Three independent signals (containers, images, build artifacts) are collected and
//! reconciled into one [`State`]. Probes may fail or disagree; the detector still
//! returns a single answer, falling back to [`State::Unknown`] only when no successful
//! signal can decide.

use esb_core::error::{EsbError, Result};
use tracing::{debug, warn};

use crate::context::Context;
use crate::state::{ContainerInfo, State};

/// Read-only queries the detector needs from the outside world.
pub trait LifecycleProbes {
    fn list_containers(&self, compose_project: &str) -> Result<Vec<ContainerInfo>>;
    fn has_images(&self, ctx: &Context) -> Result<bool>;
    fn has_build_artifacts(&self, ctx: &Context) -> Result<bool>;
}

/// Outcome of one detection.
#[derive(Debug)]
pub struct Detection {
    pub state: State,
    pub containers: Vec<ContainerInfo>,
    /// First probe failure, even when other signals still decided the state.
    pub error: Option<EsbError>,
    pub warnings: Vec<String>,
}

impl Detection {
    /// Collapse to a hard error when the state could not be decided.
    pub fn into_result(self) -> Result<State> {
        match (self.state, self.error) {
            (State::Unknown, Some(err)) => Err(err),
            (state, _) => Ok(state),
        }
    }
}

/// Priority table: running containers, then any container, then images or artifacts.
pub fn classify(
    containers: &Result<Vec<ContainerInfo>>,
    images: &Result<bool>,
    artifacts: &Result<bool>,
) -> State {
    let containers = match containers {
        Ok(list) => list,
        Err(_) => return State::Unknown,
    };
    if containers.iter().any(ContainerInfo::is_running) {
        return State::Running;
    }
    if !containers.is_empty() {
        return State::Stopped;
    }
    if matches!(images, Ok(true)) || matches!(artifacts, Ok(true)) {
        return State::Built;
    }
    if images.is_err() || artifacts.is_err() {
        return State::Unknown;
    }
    State::NotInitialized
}

pub struct Detector<P> {
    probes: P,
}

impl<P: LifecycleProbes> Detector<P> {
    pub fn new(probes: P) -> Self {
        Self { probes }
    }

    /// Query every probe, then classify.
    pub fn detect(&self, ctx: &Context) -> Detection {
        let containers = self.probes.list_containers(&ctx.compose_project);
        let images = self.probes.has_images(ctx);
        let artifacts = self.probes.has_build_artifacts(ctx);

        let state = classify(&containers, &images, &artifacts);
        debug!(
            "Detected {} for {} (containers={:?}, images={:?}, artifacts={:?})",
            state,
            ctx.compose_project,
            containers.as_ref().map(Vec::len).ok(),
            images.as_ref().ok(),
            artifacts.as_ref().ok()
        );

        let mut warnings = Vec::new();
        if state == State::Built && matches!(images, Ok(false)) {
            warnings.push("images missing; run `esb up --build`".to_string());
        }

        let (list, mut error) = match containers {
            Ok(found) => (found, None),
            Err(e) => (Vec::new(), Some(e)),
        };
        for failed in [images.err(), artifacts.err()].into_iter().flatten() {
            if error.is_none() {
                error = Some(failed);
            } else {
                warn!("Additional probe failure: {}", failed);
            }
        }

        Detection {
            state,
            containers: list,
            error,
            warnings,
        }
    }
}
