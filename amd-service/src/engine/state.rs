//! Engine lifecycle
//!
//! `Unloaded -> Loading -> Ready | LoadFailed`. Both end states are terminal:
//! the model is loaded once at startup and never reloaded.

use super::Classifier;
use crate::error::EngineLoadError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Lifecycle position without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Unloaded,
    Loading,
    Ready,
    LoadFailed,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnginePhase::Unloaded => "Unloaded",
            EnginePhase::Loading => "Loading",
            EnginePhase::Ready => "Ready",
            EnginePhase::LoadFailed => "LoadFailed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid engine transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: EnginePhase,
    pub to: EnginePhase,
}

#[derive(Default)]
pub enum EngineState {
    #[default]
    Unloaded,
    Loading,
    Ready(Arc<dyn Classifier>),
    /// Load failure reason, kept for logs
    LoadFailed(String),
}

impl EngineState {
    /// `Unloaded -> Loading`
    pub fn begin_loading(self) -> Result<Self, InvalidTransition> {
        match self {
            EngineState::Unloaded => Ok(EngineState::Loading),
            other => Err(InvalidTransition {
                from: other.phase(),
                to: EnginePhase::Loading,
            }),
        }
    }

    /// `Loading -> Ready` on success, `Loading -> LoadFailed` otherwise
    pub fn complete(
        self,
        outcome: Result<Arc<dyn Classifier>, EngineLoadError>,
    ) -> Result<Self, InvalidTransition> {
        let target = match outcome {
            Ok(classifier) => EngineState::Ready(classifier),
            Err(e) => EngineState::LoadFailed(e.to_string()),
        };

        match self {
            EngineState::Loading => Ok(target),
            other => Err(InvalidTransition {
                from: other.phase(),
                to: target.phase(),
            }),
        }
    }

    pub fn phase(&self) -> EnginePhase {
        match self {
            EngineState::Unloaded => EnginePhase::Unloaded,
            EngineState::Loading => EnginePhase::Loading,
            EngineState::Ready(_) => EnginePhase::Ready,
            EngineState::LoadFailed(_) => EnginePhase::LoadFailed,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready(_))
    }

    /// The loaded classifier, only in `Ready`
    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        match self {
            EngineState::Ready(classifier) => Some(classifier),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            EngineState::LoadFailed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Debug for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Ready(classifier) => {
                f.debug_tuple("Ready").field(&classifier.name()).finish()
            }
            EngineState::LoadFailed(reason) => f.debug_tuple("LoadFailed").field(reason).finish(),
            other => write!(f, "{}", other.phase()),
        }
    }
}
