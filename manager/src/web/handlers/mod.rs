//! HTTP request handlers for the DNS manager API.
//!
//! This module is organized by domain:
//! - `admin` - Watcher settings, scheduler control, notifications, cache and audit
//! - `common` - Response envelope, error mapping and zone access helpers
//! - `dns` - DNS record CRUD forwarded to the provider
//! - `ip` - Public IP lookup
//! - `watchers` - Watcher CRUD, manual checks and manual IP updates
//! - `zones` - Zone registry

pub mod admin;
pub mod common;
pub mod dns;
pub mod ip;
pub mod watchers;
pub mod zones;

// Re-export all public handler functions for convenience
pub use admin::*;
pub use dns::*;
pub use ip::*;
pub use watchers::*;
pub use zones::*;
