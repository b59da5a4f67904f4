use axum::Json;
use chrono::Utc;
use tomas_shared::chat::HealthResponse;

use crate::config::SERVICE_NAME;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        service: SERVICE_NAME.to_owned(),
        timestamp: Utc::now(),
    })
}
