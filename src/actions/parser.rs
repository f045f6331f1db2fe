//! Action markup parser.
//!
//! Recognised shapes:
//!
//! ```text
//! <create_file path="dir/sub/name.ext">...</create_file>
//! <update_file id="node-id">...</update_file>
//! ```
//!
//! Matching is non-greedy, unanchored and spans lines. Bodies are taken
//! verbatim. Malformed or unterminated tags produce nothing; the parser never
//! fails.

use crate::types::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CREATE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<create_file\s+path="([^"]+)">(.*?)</create_file>"#)
        .expect("valid create_file regex")
});

static UPDATE_FILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<update_file\s+id="([^"]+)">(.*?)</update_file>"#)
        .expect("valid update_file regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFile {
    /// Slash-separated logical path, leaf segment last
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFile {
    pub file_id: NodeId,
    pub content: String,
}

/// A single parsed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    CreateFile(CreateFile),
    UpdateFile(UpdateFile),
}

/// Create and update actions, each in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedActions {
    pub creates: Vec<CreateFile>,
    pub updates: Vec<UpdateFile>,
}

impl ParsedActions {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len()
    }

    /// Actions in apply order: every create, then every update.
    pub fn in_apply_order(&self) -> impl Iterator<Item = Action> + '_ {
        self.creates
            .iter()
            .cloned()
            .map(Action::CreateFile)
            .chain(self.updates.iter().cloned().map(Action::UpdateFile))
    }
}

/// Extract create and update actions from `text`.
pub fn parse_actions(text: &str) -> ParsedActions {
    let creates = CREATE_FILE_RE
        .captures_iter(text)
        .map(|caps| CreateFile {
            path: caps[1].to_string(),
            content: caps[2].to_string(),
        })
        .collect();

    let updates = UPDATE_FILE_RE
        .captures_iter(text)
        .map(|caps| UpdateFile {
            file_id: NodeId::new(&caps[1]),
            content: caps[2].to_string(),
        })
        .collect();

    ParsedActions { creates, updates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_example_response() {
        let text = "Here you go:\n<create_file path=\"src/app.js\">console.log(1)</create_file>\nDone.";
        let parsed = parse_actions(text);
        assert_eq!(
            parsed.creates,
            vec![CreateFile {
                path: "src/app.js".to_string(),
                content: "console.log(1)".to_string(),
            }]
        );
        assert!(parsed.updates.is_empty());
    }

    #[test]
    fn test_interleaved_tags_keep_source_order_per_kind() {
        let text = r#"intro
<update_file id="f1">one</update_file>
<create_file path="a.txt">A</create_file>
prose in between
<update_file id="f2">two</update_file>
<create_file path="dir/b.txt">B</create_file>"#;
        let parsed = parse_actions(text);

        let paths: Vec<&str> = parsed.creates.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "dir/b.txt"]);
        let ids: Vec<&str> = parsed.updates.iter().map(|u| u.file_id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2"]);
    }

    #[test]
    fn test_multiline_body_is_verbatim() {
        let text = "<create_file path=\"main.rs\">\nfn main() {\n    println!(\"<hi>\");\n}\n</create_file>";
        let parsed = parse_actions(text);
        assert_eq!(
            parsed.creates[0].content,
            "\nfn main() {\n    println!(\"<hi>\");\n}\n"
        );
    }

    #[test]
    fn test_empty_body_yields_empty_content() {
        let parsed = parse_actions(r#"<create_file path="empty.txt"></create_file>"#);
        assert_eq!(parsed.creates.len(), 1);
        assert_eq!(parsed.creates[0].content, "");
    }

    #[test]
    fn test_unterminated_and_malformed_tags_are_ignored() {
        let inputs = [
            r#"<create_file path="open.txt">never closed"#,
            r#"<create_file path=>bad attr</create_file>"#,
            r#"<create_file path='single.txt'>quotes</create_file>"#,
            r#"<create_file name="x">wrong attr</create_file>"#,
            r#"<update_file id="">empty id</update_file>"#,
            r#"<update_file path="a.txt">wrong attr</update_file>"#,
            "no tags at all",
        ];
        for input in inputs {
            assert!(parse_actions(input).is_empty(), "expected no actions for {input:?}");
        }
    }

    #[test]
    fn test_first_closing_marker_terminates_body() {
        let text = r#"<create_file path="a.txt">x<create_file path="b.txt">y</create_file>z</create_file>"#;
        let parsed = parse_actions(text);
        assert_eq!(parsed.creates.len(), 1);
        assert_eq!(parsed.creates[0].path, "a.txt");
        assert_eq!(parsed.creates[0].content, r#"x<create_file path="b.txt">y"#);
    }

    #[test]
    fn test_whitespace_path_passes_through() {
        let parsed = parse_actions(r#"<create_file path="   ">x</create_file>"#);
        assert_eq!(parsed.creates[0].path, "   ");
    }

    #[test]
    fn test_apply_order_puts_creates_first() {
        let text = r#"<update_file id="f1">u</update_file><create_file path="a">c</create_file>"#;
        let kinds: Vec<bool> = parse_actions(text)
            .in_apply_order()
            .map(|a| matches!(a, Action::CreateFile(_)))
            .collect();
        assert_eq!(kinds, vec![true, false]);
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_.]{1,8}"
    }

    fn body() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 \n{}();=]{0,40}"
    }

    proptest! {
        #[test]
        fn prop_extracts_every_well_formed_tag(
            creates in prop::collection::vec((prop::collection::vec(segment(), 1..4), body()), 0..6),
            updates in prop::collection::vec((segment(), body()), 0..6),
        ) {
            let mut text = String::from("Sure, here are the changes.\n");
            for (segments, content) in &creates {
                text.push_str(&format!(
                    "<create_file path=\"{}\">{}</create_file>\nnext:\n",
                    segments.join("/"),
                    content
                ));
            }
            for (id, content) in &updates {
                text.push_str(&format!("<update_file id=\"{}\">{}</update_file>\n", id, content));
            }

            let parsed = parse_actions(&text);
            prop_assert_eq!(parsed.creates.len(), creates.len());
            prop_assert_eq!(parsed.updates.len(), updates.len());
            for (action, (segments, content)) in parsed.creates.iter().zip(&creates) {
                prop_assert_eq!(&action.path, &segments.join("/"));
                prop_assert_eq!(&action.content, content);
            }
            for (action, (id, content)) in parsed.updates.iter().zip(&updates) {
                prop_assert_eq!(action.file_id.as_str(), id.as_str());
                prop_assert_eq!(&action.content, content);
            }
        }
    }
}
