// File: manager/src/web/mod.rs
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod validation;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::database::Database;
use crate::provider::CloudflareClient;
use crate::services::{AuditRecorder, NotificationService, PublicIpResolver, RateLimiter};
use crate::watcher::{WatcherEngine, WatcherScheduler};

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<Database>,
    pub provider: CloudflareClient,
    pub ip_resolver: PublicIpResolver,
    pub notifier: NotificationService,
    pub audit: AuditRecorder,
    // Watcher reconciliation
    pub engine: Arc<WatcherEngine>,
    pub scheduler: Arc<WatcherScheduler>,
    // Manual check throttling, keyed per user
    pub check_limiter: RateLimiter,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        database: Arc<Database>,
        provider: CloudflareClient,
        ip_resolver: PublicIpResolver,
        notifier: NotificationService,
        audit: AuditRecorder,
        engine: Arc<WatcherEngine>,
        scheduler: Arc<WatcherScheduler>,
        check_limiter: RateLimiter,
    ) -> Self {
        Self {
            config,
            database,
            provider,
            ip_resolver,
            notifier,
            audit,
            engine,
            scheduler,
            check_limiter,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        self.provider.cache()
    }
}
