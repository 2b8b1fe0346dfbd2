use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{db::connection::ping, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    /// `up`, `down` or `not_configured`.
    pub status: String,
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub service: String,
    pub version: String,
    /// `healthy` unless the database probe failed.
    pub status: String,
    pub database: DatabaseHealth,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match &state.pool {
        Some(pool) => match ping(pool).await {
            Ok(latency) => DatabaseHealth {
                status: "up".to_string(),
                latency_ms: Some(latency.as_millis() as u64),
            },
            Err(err) => {
                tracing::error!(error = %err, "Database health probe failed");
                DatabaseHealth {
                    status: "down".to_string(),
                    latency_ms: None,
                }
            }
        },
        None => DatabaseHealth {
            status: "not_configured".to_string(),
            latency_ms: None,
        },
    };
    let status = if database.status == "down" {
        "degraded"
    } else {
        "healthy"
    }
    .to_string();

    Json(HealthResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status,
        database,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
