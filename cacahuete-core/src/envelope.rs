//! Response envelopes.
//!
//! Records are returned as-is; only health probes get a wrapper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    Alive,
    Ready,
    NotReady,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            timestamp: Utc::now(),
        }
    }
}
