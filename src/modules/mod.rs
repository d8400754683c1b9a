pub mod config;
pub mod identity;
pub mod logger;

pub use config::*;
pub use logger::*;
