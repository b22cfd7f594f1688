// File: manager/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dns_manager::cache::ResponseCache;
use dns_manager::config::ConfigManager;
use dns_manager::constants::{cleanup, limits};
use dns_manager::database::Database;
use dns_manager::provider::CloudflareClient;
use dns_manager::services::{AuditRecorder, NotificationService, PublicIpResolver, RateLimiter};
use dns_manager::watcher::{WatcherEngine, WatcherScheduler};
use dns_manager::web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("dns_manager=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting DNS Manager");

    // Load configuration
    let config_manager = ConfigManager::new("config".to_string()).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded: {} API users, listening on {}:{}",
        config.users.len(),
        config.host,
        config.port
    );
    if config.users.is_empty() {
        warn!("No API users configured, every authenticated endpoint will answer 401");
    }

    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized at {}", config.database_path);

    let timeout = config.http_timeout();
    let cache = ResponseCache::new();
    let provider = CloudflareClient::new(&config.provider_api_base, timeout, cache)?;
    let ip_resolver = PublicIpResolver::new(&config.ipv4_lookup_url, &config.ipv6_lookup_url, timeout)?;
    let notifier = NotificationService::new(database.clone(), timeout)?;
    let audit = AuditRecorder::new(database.clone());
    info!("Provider client, IP resolver, notifier and audit recorder initialized");

    let engine = Arc::new(WatcherEngine::new(
        database.clone(),
        ip_resolver.clone(),
        provider.clone(),
        notifier.clone(),
        audit.clone(),
    ));

    let scheduler = Arc::new(WatcherScheduler::new(engine.clone(), database.clone()).await?);
    scheduler.start().await?;
    info!("Watcher scheduler started");

    let check_limiter = RateLimiter::new(
        config.manual_check_limit_per_minute,
        Duration::from_secs(limits::MANUAL_CHECK_WINDOW_SECONDS),
    );

    // Start periodic audit retention prune
    let audit_clone = audit.clone();
    let retention_days = config.audit_retention_days;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(
            cleanup::AUDIT_PRUNE_INTERVAL_SECONDS,
        ));
        loop {
            interval.tick().await;
            if let Err(e) = audit_clone.prune(retention_days).await {
                warn!("Audit retention prune failed: {}", e);
            }
        }
    });

    // Start periodic rate limiter sweep
    let limiter_clone = check_limiter.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(cleanup::RATE_LIMIT_SWEEP_SECONDS));
        loop {
            interval.tick().await;
            let swept = limiter_clone.sweep().await;
            if swept > 0 {
                info!("Dropped {} expired rate limit windows", swept);
            }
        }
    });

    info!(
        "Background tasks started: audit retention {} days, rate limit sweep every {}s",
        retention_days,
        cleanup::RATE_LIMIT_SWEEP_SECONDS
    );

    let state = AppState::new(
        config,
        database,
        provider,
        ip_resolver,
        notifier,
        audit,
        engine,
        scheduler,
        check_limiter,
    );

    // Start web server
    start_web_server(state).await?;

    Ok(())
}
