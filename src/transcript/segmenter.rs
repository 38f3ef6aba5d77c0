//! Block segmentation state machine
//!
//! The segmenter consumes normalized lines one at a time and decides where
//! one semantic block ends and the next begins. It holds at most one open
//! block; every other block it produces is finalized and immutable.
//!
//! Continuation rules while a block is open:
//!
//! | open kind      | continues on                                          |
//! |----------------|-------------------------------------------------------|
//! | `trust_prompt` | any non-blank line (one blank line closes it)         |
//! | `tool_call`    | indented lines                                        |
//! | `tool_result`  | further result lines and indented lines               |
//! | `diff`         | diff-shaped lines                                     |
//! | `thinking`     | narration markers and indented lines                  |
//! | `error`        | indented lines                                        |
//! | `status`       | further status lines                                  |
//! | `text`         | lines without a signature                             |
//!
//! Tool invocations, tool results and trust banners never continue another
//! block, even when indented.
//!
//! Permission prompts are drawn in boxes whose first rows (border, command
//! preview) arrive before the banner phrase. When the banner appears while
//! the open text block holds only boxed rows, those rows move into the new
//! `trust_prompt` block and the text block is discarded before it was ever
//! finalized.

use tracing::debug;

use crate::config::IdleSignals;
use crate::transcript::classifier::{
    is_box_framed, is_diff_shaped, is_indented, LineClassifier, LineSignature,
};
use crate::types::{Block, BlockIdAllocator, BlockKind, ExecutionStatus};

/// Outcome of feeding one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentationResult<'a> {
    /// Blocks finalized by this line, in creation order
    pub finalized: Vec<Block>,
    /// The open block after this line, still owned by the segmenter
    pub open: Option<&'a Block>,
}

#[derive(Debug)]
enum State {
    Idle,
    Open(Block),
}

pub struct Segmenter {
    classifier: LineClassifier,
    signals: IdleSignals,
    ids: BlockIdAllocator,
    state: State,
    /// Blank lines seen since the last non-blank line
    pending_blanks: usize,
    /// Tool of the most recent invocation, paired with the next result
    last_tool_name: Option<String>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(IdleSignals::default())
    }
}

impl Segmenter {
    pub fn new(signals: IdleSignals) -> Self {
        Self {
            classifier: LineClassifier::new(),
            signals,
            ids: BlockIdAllocator::new(),
            state: State::Idle,
            pending_blanks: 0,
            last_tool_name: None,
        }
    }

    /// Kind of the open block, `None` while idle
    pub fn open_kind(&self) -> Option<BlockKind> {
        match &self.state {
            State::Idle => None,
            State::Open(block) => Some(block.kind),
        }
    }

    pub fn open_block(&self) -> Option<&Block> {
        match &self.state {
            State::Idle => None,
            State::Open(block) => Some(block),
        }
    }

    /// Feed one normalized line (without its terminator)
    pub fn advance(&mut self, line: &str) -> SegmentationResult<'_> {
        let mut finalized = Vec::new();
        self.step(line, &mut finalized);
        SegmentationResult {
            finalized,
            open: self.open_block(),
        }
    }

    /// Finalize the open block without feeding a line
    pub fn close(&mut self) -> Option<Block> {
        self.pending_blanks = 0;
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => None,
            State::Open(block) => {
                debug!("Closing {} block {}", block.kind, block.id);
                Some(block.finalize())
            }
        }
    }

    /// Drop the open block and all pending state. Block ids keep increasing.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.pending_blanks = 0;
        self.last_tool_name = None;
    }

    fn step(&mut self, line: &str, finalized: &mut Vec<Block>) {
        if line.trim().is_empty() {
            self.blank_line(finalized);
            return;
        }

        if self.signals.is_idle_line(line) {
            debug!("Idle signal {:?}", line.trim());
            finalized.extend(self.close());
            return;
        }

        let signature = self.classifier.classify(line);

        // A result line completes the invocation it belongs to
        if let Some(LineSignature::ToolResult { failed }) = &signature {
            let status = result_status(*failed);
            if let State::Open(block) = &mut self.state {
                if block.kind == BlockKind::ToolCall {
                    block.set_status(status);
                }
            }
        }

        if self.continues(line, signature.as_ref()) {
            self.append(line, finalized);
            return;
        }

        if matches!(signature, Some(LineSignature::TrustPrompt)) {
            if let Some(frame) = self.take_box_frame() {
                self.open(&format!("{frame}\n{line}"), signature);
                return;
            }
        }

        finalized.extend(self.close());
        self.open(line, signature);
    }

    /// Take the open text block if it only holds the top of a box
    fn take_box_frame(&mut self) -> Option<String> {
        let State::Open(block) = &self.state else {
            return None;
        };
        if block.kind != BlockKind::Text || !block.content.lines().all(is_box_framed) {
            return None;
        }
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Open(block) => {
                debug!("Moving boxed rows of {} into trust prompt", block.id);
                Some(block.content)
            }
            State::Idle => None,
        }
    }

    fn blank_line(&mut self, finalized: &mut Vec<Block>) {
        if self.open_kind() == Some(BlockKind::TrustPrompt) {
            finalized.extend(self.close());
            return;
        }

        self.pending_blanks += 1;
        if self.pending_blanks >= self.signals.blank_lines() {
            if self.open_kind().is_some() {
                debug!("Idle signal after {} blank lines", self.pending_blanks);
            }
            finalized.extend(self.close());
        }
    }

    fn continues(&self, line: &str, signature: Option<&LineSignature>) -> bool {
        let State::Open(block) = &self.state else {
            return false;
        };
        let structural = signature.is_some_and(LineSignature::is_structural);

        match block.kind {
            BlockKind::TrustPrompt => true,
            BlockKind::ToolCall | BlockKind::Error => !structural && is_indented(line),
            BlockKind::ToolResult => {
                matches!(signature, Some(LineSignature::ToolResult { .. }))
                    || (!structural && is_indented(line))
            }
            BlockKind::Diff => !structural && is_diff_shaped(line),
            BlockKind::Thinking => {
                matches!(signature, Some(LineSignature::Thinking))
                    || (!structural && is_indented(line))
            }
            BlockKind::Status => matches!(signature, Some(LineSignature::Status)),
            BlockKind::Text => signature.is_none(),
        }
    }

    fn append(&mut self, line: &str, finalized: &mut Vec<Block>) {
        let blanks = std::mem::take(&mut self.pending_blanks);
        for _ in 0..blanks {
            self.push_capped("", finalized);
        }
        self.push_capped(line, finalized);
    }

    /// Append a line to the open block, splitting it when it would outgrow
    /// the configured size cap
    fn push_capped(&mut self, line: &str, finalized: &mut Vec<Block>) {
        let State::Open(block) = &mut self.state else {
            return;
        };

        if let Some(cap) = self.signals.max_block_bytes() {
            let grown = block.content.len() + 1 + line.len();
            if !block.content.is_empty() && grown > cap {
                let continuation = Block::open(self.ids.next_id(), block.kind, line);
                let continuation = if block.kind.is_tool() {
                    continuation.with_tool(
                        block.tool_name.clone(),
                        block.file_path.clone(),
                        block.execution_status.unwrap_or(ExecutionStatus::Pending),
                    )
                } else {
                    continuation
                };
                debug!(
                    "Splitting {} block {} at {} bytes into {}",
                    block.kind,
                    block.id,
                    block.content.len(),
                    continuation.id
                );
                let full = std::mem::replace(block, continuation);
                finalized.push(full.finalize());
                return;
            }
        }

        block.push_line(line);
    }

    fn open(&mut self, line: &str, signature: Option<LineSignature>) {
        self.pending_blanks = 0;
        let id = self.ids.next_id();

        let block = match signature {
            Some(LineSignature::ToolCall {
                tool_name,
                file_path,
            }) => {
                self.last_tool_name = Some(tool_name.clone());
                Block::open(id, BlockKind::ToolCall, line).with_tool(
                    Some(tool_name),
                    file_path,
                    ExecutionStatus::Pending,
                )
            }
            Some(LineSignature::ToolResult { failed }) => Block::open(id, BlockKind::ToolResult, line)
                .with_tool(self.last_tool_name.clone(), None, result_status(failed)),
            Some(signature) => Block::open(id, signature.kind(), line),
            None => Block::open(id, BlockKind::Text, line),
        };

        debug!("Opened {} block {}", block.kind, block.id);
        self.state = State::Open(block);
    }
}

fn result_status(failed: bool) -> ExecutionStatus {
    if failed {
        ExecutionStatus::Error
    } else {
        ExecutionStatus::Success
    }
}
