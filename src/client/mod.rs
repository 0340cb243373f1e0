pub mod wallet_api;

pub use wallet_api::WalletApiClient;
