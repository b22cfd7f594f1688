//! A fully wired manager backed by mock servers and an in-memory database

use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use dns_manager::cache::ResponseCache;
use dns_manager::config::{ApiUser, Config};
use dns_manager::database::{Database, WatcherSettings};
use dns_manager::provider::CloudflareClient;
use dns_manager::services::{AuditRecorder, NotificationService, PublicIpResolver, RateLimiter};
use dns_manager::watcher::{WatcherEngine, WatcherScheduler};
use dns_manager::web::{create_router, AppState};

use super::{
    admin_user, regular_user, users, MockCloudflareServer, MockIpServer, MockWebhookServer,
    TestDatabase, ZONE_ID,
};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestEnv {
    pub database: TestDatabase,
    pub ip: MockIpServer,
    pub cloudflare: MockCloudflareServer,
    pub webhook: MockWebhookServer,
    pub state: AppState,
}

impl TestEnv {
    /// Default users: an admin and a user assigned to the default zone
    pub async fn start() -> Result<Self> {
        Self::start_with_users(vec![admin_user(), regular_user(&[ZONE_ID])], 10).await
    }

    pub async fn start_with_users(api_users: Vec<ApiUser>, check_limit: u32) -> Result<Self> {
        let database = TestDatabase::new().await?;
        let ip = MockIpServer::start().await;
        let cloudflare = MockCloudflareServer::start().await;
        let webhook = MockWebhookServer::start().await;

        let config = Arc::new(Config {
            provider_api_base: cloudflare.api_base.clone(),
            ipv4_lookup_url: ip.ipv4_url(),
            ipv6_lookup_url: ip.ipv6_url(),
            manual_check_limit_per_minute: check_limit,
            users: users(api_users),
            ..Config::default()
        });

        let db: Arc<Database> = database.db.clone();
        let provider =
            CloudflareClient::new(&config.provider_api_base, TEST_TIMEOUT, ResponseCache::new())?;
        let ip_resolver =
            PublicIpResolver::new(&config.ipv4_lookup_url, &config.ipv6_lookup_url, TEST_TIMEOUT)?;
        let notifier = NotificationService::new(db.clone(), TEST_TIMEOUT)?;
        let audit = AuditRecorder::new(db.clone());

        let engine = Arc::new(WatcherEngine::new(
            db.clone(),
            ip_resolver.clone(),
            provider.clone(),
            notifier.clone(),
            audit.clone(),
        ));
        let scheduler = Arc::new(WatcherScheduler::new(engine.clone(), db.clone()).await?);
        let check_limiter = RateLimiter::new(check_limit, Duration::from_secs(60));

        let state = AppState::new(
            config,
            db,
            provider,
            ip_resolver,
            notifier,
            audit,
            engine,
            scheduler,
            check_limiter,
        );

        Ok(Self {
            database,
            ip,
            cloudflare,
            webhook,
            state,
        })
    }

    pub fn db(&self) -> &Database {
        &self.database.db
    }

    pub fn engine(&self) -> &WatcherEngine {
        &self.state.engine
    }

    pub fn scheduler(&self) -> &WatcherScheduler {
        &self.state.scheduler
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Deliver every notification to the mock webhook
    pub async fn enable_notifications(&self) -> Result<()> {
        self.webhook.mock_success().await;
        self.database.enable_webhook(&self.webhook.webhook_url()).await
    }

    pub async fn set_watcher_settings(&self, settings: WatcherSettings) -> Result<()> {
        self.db().save_watcher_settings(&settings).await?;
        Ok(())
    }

    pub async fn audit_actions(&self) -> Result<Vec<String>> {
        let actions: Vec<String> =
            sqlx::query_scalar("SELECT action FROM audit_logs ORDER BY id ASC")
                .fetch_all(self.database.pool())
                .await?;
        Ok(actions)
    }
}
