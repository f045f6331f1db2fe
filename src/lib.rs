//! Polaris: conversational coding-agent backend
//!
//! A user message goes in, an assistant response comes out, and any file
//! actions the response embeds (`<create_file>` / `<update_file>`) are applied
//! to a project's hierarchical file store.

pub mod actions;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod provider;
pub mod store;
pub mod tooling;
pub mod types;
