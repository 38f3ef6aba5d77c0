//! Adapter for sessions that emit typed event records instead of raw text
//!
//! Records are newline-delimited JSON objects with a `type` discriminator.
//! Block boundaries are explicit in the input, so no segmentation happens
//! here: each record type maps to exactly one block kind.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{Block, BlockId, BlockIdAllocator, BlockKind, ExecutionStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StructuredEvent {
    #[serde(rename = "system/init")]
    SystemInit {
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        tools: Vec<String>,
    },
    #[serde(rename = "assistant-text")]
    AssistantText { text: String },
    #[serde(rename = "assistant-thinking")]
    AssistantThinking { text: String },
    #[serde(rename = "assistant-tool-call")]
    AssistantToolCall {
        id: String,
        name: String,
        #[serde(default)]
        arguments: ToolArguments,
    },
    #[serde(rename = "tool-result")]
    ToolResult {
        tool_call_id: String,
        #[serde(default)]
        output: ToolOutput,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(rename = "turn-complete")]
    TurnComplete {
        #[serde(default = "default_success")]
        success: bool,
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        cost_usd: Option<f64>,
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

fn default_success() -> bool {
    true
}

/// Arguments of the tools the CLI is known to invoke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Command {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    FileEdit {
        file_path: String,
        old_string: String,
        new_string: String,
        #[serde(default)]
        replace_all: bool,
    },
    FileWrite {
        file_path: String,
        content: String,
    },
    FileRead {
        file_path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u64>,
    },
    Search {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Unrecognized(serde_json::Value),
}

impl Default for ToolArguments {
    fn default() -> Self {
        ToolArguments::Unrecognized(serde_json::Value::Null)
    }
}

impl ToolArguments {
    pub fn file_path(&self) -> Option<&str> {
        match self {
            ToolArguments::FileEdit { file_path, .. }
            | ToolArguments::FileWrite { file_path, .. }
            | ToolArguments::FileRead { file_path, .. } => Some(file_path),
            _ => None,
        }
    }

    /// Short form shown between the parentheses of a tool line
    pub fn summary(&self) -> String {
        match self {
            ToolArguments::Command { command, .. } => command.clone(),
            ToolArguments::FileEdit { file_path, .. }
            | ToolArguments::FileWrite { file_path, .. }
            | ToolArguments::FileRead { file_path, .. } => file_path.clone(),
            ToolArguments::Search { pattern, path } => match path {
                Some(path) => format!("{pattern} in {path}"),
                None => pattern.clone(),
            },
            ToolArguments::Unrecognized(serde_json::Value::Null) => String::new(),
            ToolArguments::Unrecognized(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Text(String),
    Parts(Vec<OutputPart>),
}

impl Default for ToolOutput {
    fn default() -> Self {
        ToolOutput::Text(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputPart {
    Text {
        text: String,
    },
    Image {
        #[serde(default)]
        media_type: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

impl ToolOutput {
    /// Plain-text rendition of the output
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    OutputPart::Text { text } => Some(text.clone()),
                    OutputPart::Image { media_type } => Some(format!(
                        "[image{}]",
                        media_type
                            .as_deref()
                            .map(|m| format!(": {m}"))
                            .unwrap_or_default()
                    )),
                    OutputPart::Unrecognized => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Text appended to the open block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockUpdate {
    pub id: BlockId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Adapted {
    /// A new block. Streaming blocks become the open block; finalized ones
    /// close whatever is open.
    Block(Block),
    Update(BlockUpdate),
}

/// Parse one record without adapting it
pub fn parse_event(line: &str) -> Result<StructuredEvent> {
    Ok(serde_json::from_str(line)?)
}

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    id: BlockId,
    kind: BlockKind,
}

/// Maps structured records to blocks for one session
#[derive(Debug, Default)]
pub struct StructuredAdapter {
    ids: BlockIdAllocator,
    open: Option<OpenBlock>,
    /// Tool names by invocation id, for pairing results with calls
    tool_names: HashMap<String, String>,
}

impl StructuredAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and adapt one JSON line. Malformed records are dropped.
    pub fn adapt_line(&mut self, line: &str) -> Option<Adapted> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match parse_event(line) {
            Ok(event) => self.adapt(event),
            Err(err) => {
                warn!("Dropping structured record: {err}");
                None
            }
        }
    }

    pub fn adapt(&mut self, event: StructuredEvent) -> Option<Adapted> {
        match event {
            StructuredEvent::SystemInit {
                model,
                session_id,
                cwd,
                tools,
            } => {
                debug!(
                    "Session {} initialized with {} tools",
                    session_id.as_deref().unwrap_or("<unknown>"),
                    tools.len()
                );
                let mut content = String::from("Session started");
                if let Some(model) = model {
                    content.push_str(&format!(" · model {model}"));
                }
                if let Some(cwd) = cwd {
                    content.push_str(&format!(" · {cwd}"));
                }
                Some(self.open_block(BlockKind::Status, content))
            }
            StructuredEvent::AssistantText { text } => Some(self.append_or_open(BlockKind::Text, text)),
            StructuredEvent::AssistantThinking { text } => {
                Some(self.append_or_open(BlockKind::Thinking, text))
            }
            StructuredEvent::AssistantToolCall {
                id,
                name,
                arguments,
            } => {
                self.tool_names.insert(id.clone(), name.clone());
                let content = format!("{name}({})", arguments.summary());
                let block = Block::open(self.ids.next_id(), BlockKind::ToolCall, content)
                    .with_tool(
                        Some(name),
                        arguments.file_path().map(str::to_string),
                        ExecutionStatus::Running,
                    )
                    .with_call_id(Some(id));
                Some(self.track(block))
            }
            StructuredEvent::ToolResult {
                tool_call_id,
                output,
                is_error,
            } => {
                let status = if is_error {
                    ExecutionStatus::Error
                } else {
                    ExecutionStatus::Success
                };
                let tool_name = self.tool_names.get(&tool_call_id).cloned();
                if tool_name.is_none() {
                    debug!("Result for unknown tool call {tool_call_id}");
                }
                let block = Block::open(self.ids.next_id(), BlockKind::ToolResult, output.to_text())
                    .with_tool(tool_name, None, status)
                    .with_call_id(Some(tool_call_id));
                Some(self.track(block))
            }
            StructuredEvent::TurnComplete {
                success,
                duration_ms,
                cost_usd,
                result,
            } => {
                let (kind, mut content) = if success {
                    (BlockKind::Status, String::from("Turn complete"))
                } else {
                    (
                        BlockKind::Error,
                        result.unwrap_or_else(|| String::from("Turn failed")),
                    )
                };
                if let Some(ms) = duration_ms {
                    content.push_str(&format!(" · {:.1}s", ms as f64 / 1000.0));
                }
                if let Some(cost) = cost_usd {
                    content.push_str(&format!(" · ${cost:.4}"));
                }
                self.open = None;
                let block = Block::open(self.ids.next_id(), kind, content).finalize();
                Some(Adapted::Block(block))
            }
            StructuredEvent::Unrecognized => {
                debug!("Ignoring unrecognized structured record");
                None
            }
        }
    }

    /// The stream ended; later text starts a new block
    pub fn close(&mut self) {
        self.open = None;
    }

    /// Forget the open block and known tool calls. Block ids keep increasing.
    pub fn reset(&mut self) {
        self.open = None;
        self.tool_names.clear();
    }

    fn append_or_open(&mut self, kind: BlockKind, text: String) -> Adapted {
        match self.open {
            Some(open) if open.kind == kind => Adapted::Update(BlockUpdate { id: open.id, text }),
            _ => self.open_block(kind, text),
        }
    }

    fn open_block(&mut self, kind: BlockKind, content: String) -> Adapted {
        let block = Block::open(self.ids.next_id(), kind, content);
        self.track(block)
    }

    fn track(&mut self, block: Block) -> Adapted {
        self.open = Some(OpenBlock {
            id: block.id,
            kind: block.kind,
        });
        Adapted::Block(block)
    }
}
