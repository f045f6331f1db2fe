//! Conversation domain: the message processing workflow, its prompts,
//! cancellation, and the file listing offered to the assistant.

pub mod cancel;
pub mod listing;
pub mod process;
pub mod prompt;

pub use cancel::{CancelSignal, Cancellations};
pub use listing::{list_files, list_files_tool, FileListing};
pub use process::{
    MessageEvent, MessageProcessor, ProcessOutcome, WorkflowSettings, EMPTY_RESPONSE_FALLBACK,
    FAILURE_MESSAGE,
};
pub use prompt::{build_system_prompt, CODING_AGENT_SYSTEM_PROMPT, TITLE_GENERATOR_SYSTEM_PROMPT};
