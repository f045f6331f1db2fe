pub mod config;

pub use config::{ProviderConfig, ProviderType, DEFAULT_ENDPOINT, DEFAULT_MODEL};
