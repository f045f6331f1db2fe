//! Text generation provider: configuration and clients for the language model
//! that writes assistant responses and conversation titles.

pub mod client;
pub mod profile;

pub use client::{OpenAiCompatibleClient, TextGenerator};
pub use profile::{ProviderConfig, ProviderType};
