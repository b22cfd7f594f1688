// Common types and utilities for API handlers

use axum::{http::StatusCode, response::Json};
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use crate::config::ApiUser;
use crate::database::ZoneRecord;
use crate::errors::ManagerError;

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

// Helper type for API responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::error(message.into())))
}

pub fn not_found(what: &str, id: &str) -> ApiError {
    failure(StatusCode::NOT_FOUND, format!("{} {} not found", what, id))
}

/// Logs the cause and hides it behind a 500
pub fn internal(context: &str, err: anyhow::Error) -> ApiError {
    error!("{}: {:#}", context, err);
    failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{}: {}", context, err),
    )
}

pub fn status_for(err: &ManagerError) -> StatusCode {
    match err {
        ManagerError::Validation(_) => StatusCode::BAD_REQUEST,
        ManagerError::Provider(_) => StatusCode::BAD_GATEWAY,
        ManagerError::Config(_) | ManagerError::Database(_) | ManagerError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<ManagerError> for (StatusCode, Json<ApiResponse<()>>) {
    fn from(err: ManagerError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            error!("Request failed: {}", err);
        }
        failure(status, err.to_string())
    }
}

/// Zones the caller may act on
pub fn visible_zones(user: &ApiUser, zones: Vec<ZoneRecord>) -> Vec<ZoneRecord> {
    zones
        .into_iter()
        .filter(|zone| user.can_access_zone(&zone.zone_id))
        .collect()
}

pub fn require_zone_access(user: &ApiUser, zone: &ZoneRecord) -> Result<(), ApiError> {
    if user.can_access_zone(&zone.zone_id) {
        Ok(())
    } else {
        Err(failure(
            StatusCode::FORBIDDEN,
            format!("Access denied to zone {}", zone.zone_name),
        ))
    }
}
