pub mod audit;
pub mod notification;
pub mod public_ip;
pub mod rate_limit;

pub use audit::AuditRecorder;
pub use notification::{NotificationEvent, NotificationPayload, NotificationService};
pub use public_ip::{PublicIpResolver, PublicIps};
pub use rate_limit::RateLimiter;
