//! SurrealDB repository implementations.

mod beacon;
mod scan_event;
mod scan_quota;
mod xp_account;

pub use beacon::SurrealBeaconRepository;
pub use scan_event::SurrealScanEventRepository;
pub use scan_quota::SurrealScanQuotaRepository;
pub use xp_account::SurrealXpAccountRepository;
