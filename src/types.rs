use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transcript::diff::{parse_diff, DiffLine};

/// Stable identifier of a block within one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block-{}", self.0)
    }
}

/// Hands out block ids for a single session.
///
/// Ids keep increasing across `reset()` of the owning parser, so an id seen
/// by a consumer is never handed out again by the same instance.
#[derive(Debug)]
pub struct BlockIdAllocator {
    next: u64,
}

impl Default for BlockIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> BlockId {
        let id = BlockId(self.next);
        self.next += 1;
        id
    }
}

/// Semantic kind of a transcript block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    ToolCall,
    ToolResult,
    Diff,
    Thinking,
    Status,
    Error,
    TrustPrompt,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::ToolCall => "tool_call",
            BlockKind::ToolResult => "tool_result",
            BlockKind::Diff => "diff",
            BlockKind::Thinking => "thinking",
            BlockKind::Status => "status",
            BlockKind::Error => "error",
            BlockKind::TrustPrompt => "trust_prompt",
        }
    }

    /// Whether blocks of this kind carry tool metadata
    pub fn is_tool(&self) -> bool {
        matches!(self, BlockKind::ToolCall | BlockKind::ToolResult)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending, // Tool line seen, no completion signal yet
    Running, // Invocation announced by a structured record
    Success, // Result observed without a failure signal
    Error,   // Result observed with a failure signal
}

/// The atomic output unit of a session transcript.
///
/// A block is append-only while it is the parser's open block and never
/// changes after it has been finalized. Only the parser mutates blocks, so
/// the mutating helpers are crate-private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_status: Option<ExecutionStatus>,
    /// Tool invocation id from structured records; never set on the raw-text path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_streaming: bool,
}

impl Block {
    /// Create a new open block holding its first line of content
    pub(crate) fn open(id: BlockId, kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            tool_name: None,
            file_path: None,
            execution_status: None,
            call_id: None,
            created_at: Utc::now(),
            is_streaming: true,
        }
    }

    pub(crate) fn with_tool(
        mut self,
        tool_name: Option<String>,
        file_path: Option<String>,
        status: ExecutionStatus,
    ) -> Self {
        debug_assert!(self.kind.is_tool());
        self.tool_name = tool_name;
        self.file_path = file_path;
        self.execution_status = Some(status);
        self
    }

    pub(crate) fn with_call_id(mut self, call_id: Option<String>) -> Self {
        self.call_id = call_id;
        self
    }

    /// Append one line of content, separating it from existing content
    pub(crate) fn push_line(&mut self, line: &str) {
        debug_assert!(self.is_streaming, "finalized blocks are immutable");
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(line);
    }

    /// Append raw text without inserting a separator (structured deltas)
    pub(crate) fn push_str(&mut self, text: &str) {
        debug_assert!(self.is_streaming, "finalized blocks are immutable");
        self.content.push_str(text);
    }

    pub(crate) fn set_status(&mut self, status: ExecutionStatus) {
        debug_assert!(self.is_streaming, "finalized blocks are immutable");
        if self.kind.is_tool() {
            self.execution_status = Some(status);
        }
    }

    pub(crate) fn finalize(mut self) -> Self {
        self.is_streaming = false;
        self
    }

    /// Line-level view of a diff block; empty for every other kind
    pub fn diff_lines(&self) -> Vec<DiffLine> {
        if self.kind == BlockKind::Diff {
            parse_diff(&self.content)
        } else {
            Vec::new()
        }
    }

    pub fn is_finalized(&self) -> bool {
        !self.is_streaming
    }
}
