//! CLI Tooling
//!
//! Command-line interface for Polaris. Every command returns its rendered
//! output as a string; the binary prints it.

use crate::actions::{apply_actions, parse_actions, Action, ApplyReport, ParsedActions};
use crate::config::{ConfigLoader, PolarisConfig};
use crate::conversation::{
    list_files_tool, Cancellations, MessageEvent, MessageProcessor, ProcessOutcome,
};
use crate::error::ApiError;
use crate::provider::OpenAiCompatibleClient;
use crate::store::{MessageRole, MessageStatus, SledDocumentStore, DEFAULT_CONVERSATION_TITLE};
use crate::types::{ConversationId, ProjectId};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Polaris CLI - apply assistant file actions to project trees
#[derive(Parser)]
#[command(name = "polaris")]
#[command(about = "Conversational coding agent backend: parse and apply file actions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the actions embedded in a response
    Parse {
        /// Response text file (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Apply the actions embedded in a response to a project
    Apply {
        #[arg(long)]
        project: String,
        /// Response text file (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print a project's file listing as JSON
    Tree {
        #[arg(long)]
        project: String,
    },
    /// Send one message through the full conversation workflow
    Chat {
        #[arg(long)]
        project: String,
        /// Existing conversation; a new one is created when omitted
        #[arg(long)]
        conversation: Option<String>,
        message: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Fold the logging flags into `config`.
    pub fn apply_logging_overrides(&self, config: &mut PolarisConfig) {
        let logging = &mut config.logging;
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
    }
}

/// CLI context: effective configuration plus the lazily opened store
pub struct CliContext {
    config: PolarisConfig,
}

impl CliContext {
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = ConfigLoader::load(cli.config.as_deref())?;
        cli.apply_logging_overrides(&mut config);
        Ok(Self { config })
    }

    pub fn from_config(config: PolarisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolarisConfig {
        &self.config
    }

    fn open_store(&self) -> Result<SledDocumentStore, ApiError> {
        let path = self.config.store.resolve_path()?;
        std::fs::create_dir_all(&path)?;
        info!(path = %path.display(), "Opening document store");
        Ok(SledDocumentStore::open(&path)?)
    }

    fn runtime() -> Result<tokio::runtime::Runtime, ApiError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(ApiError::Io)
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Parse { input, format } => {
                let text = read_input(input.as_deref())?;
                let parsed = parse_actions(&text);
                format_parsed(&parsed, format)
            }
            Commands::Apply { project, input } => {
                let text = read_input(input.as_deref())?;
                let parsed = parse_actions(&text);
                let store = self.open_store()?;
                let project_id = ProjectId::from(project.as_str());
                let report = Self::runtime()?.block_on(apply_actions(&store, &project_id, &parsed));
                store.flush()?;
                Ok(format_apply_report(&report))
            }
            Commands::Tree { project } => {
                let store = self.open_store()?;
                let project_id = ProjectId::from(project.as_str());
                Ok(Self::runtime()?.block_on(list_files_tool(&store, &project_id)))
            }
            Commands::Chat {
                project,
                conversation,
                message,
            } => self.execute_chat(project, conversation.as_deref(), message),
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn execute_chat(
        &self,
        project: &str,
        conversation: Option<&str>,
        message: &str,
    ) -> Result<String, ApiError> {
        let store = Arc::new(self.open_store()?);
        let project_id = ProjectId::from(project);
        let conversation_id = match conversation {
            Some(id) => ConversationId::from(id),
            None => store.create_conversation(&project_id, DEFAULT_CONVERSATION_TITLE)?,
        };
        store.add_message(
            &conversation_id,
            MessageRole::User,
            message,
            MessageStatus::Completed,
        )?;
        let message_id = store.add_message(
            &conversation_id,
            MessageRole::Assistant,
            "",
            MessageStatus::Processing,
        )?;

        let generator = Arc::new(OpenAiCompatibleClient::new(self.config.provider.clone())?);
        let processor =
            MessageProcessor::new(Arc::clone(&store), generator, self.config.workflow.clone());
        let event = MessageEvent {
            message_id: message_id.clone(),
            conversation_id,
            project_id,
            message: message.to_string(),
        };

        let cancellations = Cancellations::new();
        let signal = cancellations.register(&message_id);
        let result = Self::runtime()?.block_on(processor.handle(&event, &signal));
        cancellations.release(&message_id);
        store.flush()?;

        Ok(format_chat_outcome(&result?))
    }
}

fn read_input(input: Option<&Path>) -> Result<String, ApiError> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn preview(content: &str) -> String {
    let first = content.lines().next().unwrap_or("");
    let lines = content.lines().count();
    if lines > 1 {
        format!("{} (+{} lines)", first, lines - 1)
    } else {
        first.to_string()
    }
}

/// Render parsed actions as a table, or as JSON when `format` is "json".
pub fn format_parsed(parsed: &ParsedActions, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        let actions: Vec<Action> = parsed.in_apply_order().collect();
        return serde_json::to_string_pretty(&actions)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render actions: {}", e)));
    }
    if parsed.is_empty() {
        return Ok("No actions found.".to_string());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Action", "Target", "Content"]);
    for (index, action) in parsed.in_apply_order().enumerate() {
        let (kind, target, content) = match &action {
            Action::CreateFile(create) => ("create", create.path.clone(), &create.content),
            Action::UpdateFile(update) => ("update", update.file_id.to_string(), &update.content),
        };
        table.add_row(vec![
            (index + 1).to_string(),
            kind.to_string(),
            target,
            preview(content),
        ]);
    }
    Ok(format!(
        "{}\n{}\n\nTotal: {} create(s), {} update(s)",
        heading("Parsed Actions"),
        table,
        parsed.creates.len(),
        parsed.updates.len()
    ))
}

/// Render an apply report.
pub fn format_apply_report(report: &ApplyReport) -> String {
    if report.outcomes.is_empty() {
        return "No actions to apply.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Action", "Status", "Detail"]);
    for outcome in &report.outcomes {
        let (status, detail) = match &outcome.result {
            Ok(node_id) => ("ok".to_string(), node_id.to_string()),
            Err(e) => (format!("{}", "failed".red()), e.to_string()),
        };
        table.add_row(vec![outcome.target.to_string(), status, detail]);
    }
    format!(
        "{}\n{}\n\nCreated: {}  Updated: {}  Failed: {}  Folders created: {}  Duration: {}ms",
        heading("Apply Report"),
        table,
        report.created(),
        report.updated(),
        report.failed(),
        report.folders_created,
        report.duration_ms
    )
}

fn format_chat_outcome(outcome: &ProcessOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", heading("Conversation")));
    out.push_str(&format!("  Id: {}\n", outcome.conversation_id));
    if let Some(title) = &outcome.title {
        out.push_str(&format!("  Title: {}\n", title));
    }
    out.push_str(&format!("  Message: {}\n\n", outcome.message_id));
    out.push_str(&format!("{}\n{}\n", heading("Response"), outcome.response));
    if !outcome.report.outcomes.is_empty() {
        out.push('\n');
        out.push_str(&format_apply_report(&outcome.report));
    }
    out
}
