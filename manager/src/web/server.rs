// File: manager/src/web/server.rs
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === PUBLIC ===
        .route("/api/ip", get(handlers::get_public_ip))
        // === ZONES ===
        .route(
            "/api/zones",
            get(handlers::list_zones).post(handlers::create_zone),
        )
        .route("/api/zones/{zone_id}", delete(handlers::delete_zone))
        // === DNS RECORDS ===
        .route(
            "/api/dns/records",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/dns/records/{zone_id}/{record_id}",
            patch(handlers::update_record).delete(handlers::delete_record),
        )
        // === WATCHERS ===
        .route(
            "/api/watchers",
            get(handlers::list_watchers).post(handlers::create_watcher),
        )
        .route("/api/watchers/check", post(handlers::trigger_check))
        .route(
            "/api/watchers/{id}",
            patch(handlers::update_watcher).delete(handlers::delete_watcher),
        )
        .route("/api/watchers/{id}/sync", post(handlers::sync_watcher_ip))
        // === ADMIN ===
        .route(
            "/api/admin/watcher-settings",
            get(handlers::get_watcher_settings).patch(handlers::update_watcher_settings),
        )
        .route(
            "/api/admin/watcher-scheduler",
            get(handlers::get_scheduler_status).post(handlers::scheduler_action),
        )
        .route(
            "/api/admin/notifications",
            get(handlers::get_notification_settings).put(handlers::update_notification_settings),
        )
        .route(
            "/api/admin/cache",
            get(handlers::get_cache_status)
                .patch(handlers::update_cache_ttl)
                .delete(handlers::clear_cache),
        )
        .route("/api/admin/audit-logs", get(handlers::get_audit_logs))
        // Add middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
