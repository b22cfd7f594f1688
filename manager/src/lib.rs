pub mod cache;
pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod provider;
pub mod services;
pub mod watcher;
pub mod web;

// Re-export commonly used types
pub use cache::ResponseCache;
pub use config::{Config, ConfigManager};
pub use database::Database;
pub use provider::CloudflareClient;
pub use watcher::{WatcherEngine, WatcherScheduler};
pub use web::AppState;
