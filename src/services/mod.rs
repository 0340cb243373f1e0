pub mod coordinator;
pub mod detection;
pub mod event_bus;
pub mod ports;
pub mod tracker;
pub mod wallet;

pub use coordinator::{CoordinatorSettings, RequestCoordinator};
pub use event_bus::EventBus;
pub use ports::{BalanceSource, HealthCheck, RequestIssuer, WalletLedger};
pub use tracker::CheckOutcome;
pub use wallet::WalletService;
