//! Health check infrastructure for the predictor service
//!
//! Tracks whether the artifacts are loaded and whether the model has been
//! answering requests, for liveness and readiness probes.

use crate::error::PredictorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still serving, but the last request failed
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub model_version: Option<String>,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let mut has_degraded = false;

        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => has_degraded = true,
                ComponentStatus::Healthy => {}
            }
        }

        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const ARTIFACTS: &str = "artifacts";
    pub const PREDICTOR: &str = "predictor";
}

/// Consecutive model failures after which the predictor is unhealthy
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

#[derive(Debug, Default)]
struct RegistryState {
    components: HashMap<String, ComponentHealth>,
    model_version: Option<String>,
    ready: bool,
    consecutive_failures: u32,
}

/// Health registry shared between the request handlers and the probes
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with initial healthy status
    pub async fn register(&self, name: &str) {
        let mut state = self.state.write().await;
        state
            .components
            .insert(name.to_string(), ComponentHealth::healthy());
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut state = self.state.write().await;
        state.components.insert(name.to_string(), health);
    }

    /// Mark the artifacts as loaded and the service as ready
    pub async fn mark_loaded(&self, model_version: &str) {
        let mut state = self.state.write().await;
        state
            .components
            .insert(components::ARTIFACTS.to_string(), ComponentHealth::healthy());
        state.model_version = Some(model_version.to_string());
        state.ready = true;
    }

    /// Fold a request outcome into the predictor component. Input errors are
    /// the caller's fault and leave the predictor status untouched. A model
    /// or layout failure degrades the predictor; a run of
    /// `MAX_CONSECUTIVE_FAILURES` makes it unhealthy until the next success.
    pub async fn record_outcome(&self, outcome: Result<(), &PredictorError>) {
        let mut state = self.state.write().await;
        let health = match outcome {
            Ok(()) => {
                state.consecutive_failures = 0;
                ComponentHealth::healthy()
            }
            Err(e)
                if matches!(
                    e,
                    PredictorError::ModelInvocation(_) | PredictorError::SchemaMismatch { .. }
                ) =>
            {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    ComponentHealth::unhealthy(format!(
                        "{} consecutive failures, last: {}",
                        state.consecutive_failures, e
                    ))
                } else {
                    ComponentHealth::degraded(e.to_string())
                }
            }
            Err(_) => return,
        };
        state
            .components
            .insert(components::PREDICTOR.to_string(), health);
    }

    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.ready = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let state = self.state.read().await;
        HealthResponse {
            status: HealthResponse::compute_status(&state.components),
            model_version: state.model_version.clone(),
            components: state.components.clone(),
        }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = self.state.read().await.ready;
        let health = self.health().await;

        if !ready {
            ReadinessResponse {
                ready: false,
                reason: Some("Artifacts not yet loaded".to_string()),
            }
        } else if !health.status.is_operational() {
            ReadinessResponse {
                ready: false,
                reason: Some("Critical component unhealthy".to_string()),
            }
        } else {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        }
    }
}
