// File: manager/src/web/middleware.rs
//! Request extractors for authentication and client identification.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, StatusCode},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use crate::config::ApiUser;
use crate::web::handlers::common::{failure, ApiError};
use crate::web::AppState;

/// Extractor that resolves the bearer API key to a configured user.
///
/// # Example
/// ```ignore
/// async fn my_handler(
///     AuthUser(user): AuthUser,
///     State(state): State<AppState>,
/// ) -> ApiResult<Value> {
///     // user is authenticated here
/// }
/// ```
pub struct AuthUser(pub ApiUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let Some(token) = token else {
            return Err(failure(StatusCode::UNAUTHORIZED, "Authentication required"));
        };

        match state.config.find_user_by_api_key(token) {
            Some(user) => Ok(AuthUser(user.clone())),
            None => Err(failure(StatusCode::UNAUTHORIZED, "Invalid API key")),
        }
    }
}

/// Like [`AuthUser`] but only admits admins
pub struct AdminUser(pub ApiUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(failure(StatusCode::FORBIDDEN, "Admin role required"));
        }
        Ok(AdminUser(user))
    }
}

/// Caller address and user agent, recorded on audit entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let forwarded = header_value("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|hop| hop.trim().to_string()))
            .filter(|hop| !hop.is_empty());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let ip = forwarded
            .or_else(|| header_value("x-real-ip"))
            .or(peer)
            .map(|ip| normalize_ip(&ip));

        Ok(ClientInfo {
            ip,
            user_agent: header_value(header::USER_AGENT.as_str()),
        })
    }
}

/// `::ffff:1.2.3.4` becomes `1.2.3.4`; anything unparseable is kept as is
pub fn normalize_ip(raw: &str) -> String {
    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(ip) => ip.to_string(),
        Err(_) => raw.to_string(),
    }
}
