//! Action Engine
//!
//! Turns free text produced by a language model into file tree mutations.
//! The parser extracts `<create_file>` and `<update_file>` tags, the resolver
//! maps slash-delimited paths onto folder nodes (creating missing ones), and the
//! applier runs every action independently against the document store.

pub mod applier;
pub mod parser;
pub mod resolver;

pub use applier::{
    apply_actions, execute_text_actions, ActionOutcome, ActionTarget, ApplyReport,
};
pub use parser::{parse_actions, Action, CreateFile, ParsedActions, UpdateFile};
pub use resolver::{split_leaf, PathResolver, ResolutionCache};
