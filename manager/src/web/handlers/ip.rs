use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use super::common::{failure, ApiResponse, ApiResult};
use crate::services::PublicIps;
use crate::web::AppState;

/// Public addresses of this host, no authentication
pub async fn get_public_ip(State(state): State<AppState>) -> ApiResult<PublicIps> {
    match state.ip_resolver.resolve().await {
        Ok(ips) => Ok(Json(ApiResponse::success(ips))),
        Err(e) => {
            warn!("Public IP lookup failed: {:#}", e);
            Err(failure(
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch public IP: {}", e),
            ))
        }
    }
}
