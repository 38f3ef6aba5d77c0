//! Per-session parsers and the transcript they maintain

use tracing::{debug, trace};

use crate::config::IdleSignals;
use crate::transcript::assembler::{ChunkAssembler, NormalizedText};
use crate::transcript::merge::merge;
use crate::transcript::segmenter::{SegmentationResult, Segmenter};
use crate::transcript::structured::{Adapted, StructuredAdapter, StructuredEvent};
use crate::types::{Block, BlockKind, ExecutionStatus};

/// Ordered finalized blocks plus the open block, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    blocks: Vec<Block>,
    open: Option<Block>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalized blocks in creation order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn open_block(&self) -> Option<&Block> {
        self.open.as_ref()
    }

    /// Finalized blocks followed by the open block
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().chain(self.open.iter())
    }

    /// Finalized blocks with adjacent text coalesced for display
    pub fn merged(&self) -> Vec<Block> {
        merge(&self.blocks)
    }

    pub fn len(&self) -> usize {
        self.blocks.len() + usize::from(self.open.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.open.is_none()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.open = None;
    }

    pub(crate) fn push_finalized(&mut self, block: Block) {
        debug_assert!(block.is_finalized(), "only finalized blocks are appended");
        debug_assert!(
            self.blocks.last().map_or(true, |last| last.id < block.id),
            "block ids must increase"
        );
        self.blocks.push(block);
    }

    pub(crate) fn set_open(&mut self, open: Option<Block>) {
        debug_assert!(open.as_ref().map_or(true, |block| block.is_streaming));
        self.open = open;
    }

    /// Mirror the segmenter's open block.
    ///
    /// Open blocks only grow, so while the id is unchanged just the bytes
    /// appended since the last sync are copied.
    pub(crate) fn sync_open(&mut self, source: Option<&Block>) {
        if let (Some(open), Some(source)) = (self.open.as_mut(), source) {
            if open.id == source.id {
                debug_assert!(source.content.starts_with(open.content.as_str()));
                if let Some(appended) = source.content.get(open.content.len()..) {
                    open.push_str(appended);
                }
                open.execution_status = source.execution_status;
                return;
            }
        }
        self.set_open(source.cloned());
    }

    fn open_mut(&mut self) -> Option<&mut Block> {
        self.open.as_mut()
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            self.push_finalized(open.finalize());
        }
    }

}

/// Raw-text parser for one session: assembler, segmenter and transcript
pub struct SessionParser {
    assembler: ChunkAssembler,
    segmenter: Segmenter,
    transcript: Transcript,
}

impl Default for SessionParser {
    fn default() -> Self {
        Self::new(IdleSignals::default())
    }
}

impl SessionParser {
    pub fn new(signals: IdleSignals) -> Self {
        Self {
            assembler: ChunkAssembler::new(),
            segmenter: Segmenter::new(signals),
            transcript: Transcript::new(),
        }
    }

    /// Feed a raw PTY chunk. Returns how many blocks it finalized.
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        let normalized = self.assembler.feed(chunk);
        self.segment(normalized)
    }

    /// Emit the partial line, if any, without closing the open block
    pub fn flush(&mut self) -> usize {
        let normalized = self.assembler.flush();
        self.segment(normalized)
    }

    /// End of stream: flush the partial line and finalize the open block
    pub fn finish(&mut self) -> usize {
        let mut count = self.flush();
        if let Some(block) = self.segmenter.close() {
            self.transcript.push_finalized(block);
            count += 1;
        }
        self.transcript.set_open(None);
        count
    }

    /// Clear the buffer and the transcript for a restarted session
    pub fn reset(&mut self) {
        debug!("Resetting session parser");
        self.assembler.reset();
        self.segmenter.reset();
        self.transcript.clear();
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn blocks(&self) -> &[Block] {
        self.transcript.blocks()
    }

    pub fn open_block(&self) -> Option<&Block> {
        self.transcript.open_block()
    }

    pub fn merged(&self) -> Vec<Block> {
        self.transcript.merged()
    }

    /// Text received after the last line break
    pub fn partial_line(&self) -> &str {
        self.assembler.partial_line()
    }

    /// Whether the assembler holds an unterminated line
    pub fn has_remainder(&self) -> bool {
        self.assembler.has_remainder()
    }

    fn segment(&mut self, normalized: NormalizedText) -> usize {
        if !normalized.hints.is_empty() {
            trace!("Position hints: {:?}", normalized.hints);
        }
        let mut count = 0;
        for line in normalized.lines() {
            let SegmentationResult { finalized, .. } = self.segmenter.advance(line);
            count += finalized.len();
            for block in finalized {
                self.transcript.push_finalized(block);
            }
        }
        self.transcript.sync_open(self.segmenter.open_block());
        count
    }
}

/// Structured-record session: adapter and transcript
#[derive(Debug, Default)]
pub struct StructuredSession {
    adapter: StructuredAdapter,
    transcript: Transcript,
    /// Bytes of a record whose line break has not arrived yet
    buffer: Vec<u8>,
}

impl StructuredSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of newline-delimited records
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.feed_line(&String::from_utf8_lossy(&line));
        }
    }

    /// Parse and apply one JSON record; malformed records are dropped
    pub fn feed_line(&mut self, line: &str) {
        if let Some(adapted) = self.adapter.adapt_line(line) {
            self.apply(adapted);
        }
    }

    pub fn feed_event(&mut self, event: StructuredEvent) {
        if let Some(adapted) = self.adapter.adapt(event) {
            self.apply(adapted);
        }
    }

    /// Apply a trailing record without line break and finalize the open block
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.feed_line(&String::from_utf8_lossy(&line));
        }
        self.adapter.close();
        self.transcript.close_open();
    }

    pub fn reset(&mut self) {
        debug!("Resetting structured session");
        self.adapter.reset();
        self.transcript.clear();
        self.buffer.clear();
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn blocks(&self) -> &[Block] {
        self.transcript.blocks()
    }

    pub fn open_block(&self) -> Option<&Block> {
        self.transcript.open_block()
    }

    pub fn merged(&self) -> Vec<Block> {
        self.transcript.merged()
    }

    fn apply(&mut self, adapted: Adapted) {
        match adapted {
            Adapted::Update(update) => match self.transcript.open_mut() {
                Some(open) if open.id == update.id => open.push_str(&update.text),
                _ => debug!("Dropping update for {} which is not open", update.id),
            },
            Adapted::Block(block) => {
                if block.kind == BlockKind::ToolResult {
                    self.complete_call(&block);
                }
                self.transcript.close_open();
                if block.is_streaming {
                    self.transcript.set_open(Some(block));
                } else {
                    self.transcript.push_finalized(block);
                }
            }
        }
    }

    /// Carry a result's status over to its still-open invocation
    fn complete_call(&mut self, result: &Block) {
        let Some(open) = self.transcript.open_mut() else {
            return;
        };
        if open.kind == BlockKind::ToolCall && open.call_id.is_some() && open.call_id == result.call_id
        {
            open.set_status(result.execution_status.unwrap_or(ExecutionStatus::Success));
        }
    }
}
