//! System prompts and conversation history rendering.

use crate::store::Message;
use crate::types::MessageId;

/// System prompt for the coding assistant. Documents the action markup the
/// action parser understands.
pub const CODING_AGENT_SYSTEM_PROMPT: &str = r#"<identity>
You are Polaris, a coding assistant that works inside the user's project. You change the project by writing files.
</identity>

<actions>
You cannot call tools. To change files, write these tags in your reply:

Create a file (folders in the path are created for you):
<create_file path="path/to/file.ext">
full file content
</create_file>

Replace the content of an existing file, identified by its id:
<update_file id="file-id">
full new content
</update_file>
</actions>

<rules>
- Use the full path, separated by "/", in the path attribute.
- Attribute values are double-quoted and must not contain double quotes.
- Write complete, valid file content; updates replace the whole file.
- You may write several tags in one reply.
- Outside the tags, briefly tell the user what you changed.
</rules>"#;

pub const TITLE_GENERATOR_SYSTEM_PROMPT: &str = "Write a short, descriptive title of 3 to 6 words for a conversation that starts with the user's message. Reply with the title only: no quotes and no trailing punctuation.";

/// Append previous conversation turns to `base`.
///
/// The message being processed and blank messages are left out. With nothing
/// left, `base` is returned unchanged.
pub fn build_system_prompt(base: &str, history: &[Message], current: &MessageId) -> String {
    let turns: Vec<String> = history
        .iter()
        .filter(|m| &m.message_id != current && !m.content.trim().is_empty())
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect();

    if turns.is_empty() {
        return base.to_string();
    }

    format!(
        "{}\n\n## Previous Conversation (context only, do not repeat these responses):\n{}\n\n## Current Request:\nRespond only to the user's new message below. Do not repeat or refer to your previous responses.",
        base,
        turns.join("\n\n")
    )
}
