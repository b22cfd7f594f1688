//! This module provides reusable test utilities:
//! - Mock HTTP servers (public IP echo, Cloudflare API, chat webhook)
//! - In-memory test databases
//! - Common test data
//! - A fully wired application for engine and router tests

// Allow unused code in test fixtures - each test binary uses a subset
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_cloudflare;
pub mod mock_ip;
pub mod mock_webhook;
pub mod test_data;
pub mod test_database;
pub mod test_env;

// Re-export commonly used items
pub use mock_cloudflare::MockCloudflareServer;
pub use mock_ip::MockIpServer;
pub use mock_webhook::MockWebhookServer;
pub use test_data::*;
pub use test_database::TestDatabase;
pub use test_env::TestEnv;
