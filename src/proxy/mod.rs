// proxy module - authenticating forward proxy

pub mod common; // Header and whitelist helpers
pub mod config;
pub mod handlers; // Forward handler
pub mod middleware; // Axum middleware
pub mod server;
pub mod token_manager;
pub mod upstream; // Upstream client

pub use config::ProxyConfig;
pub use server::{AppState, AxumServer};
pub use token_manager::TokenManager;
