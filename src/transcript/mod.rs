//! Streaming session transcript parser
//!
//! Raw PTY output flows through the assembler (control-sequence
//! normalization and line assembly) into the segmenter, which consults the
//! classifiers and produces finalized blocks plus at most one open block.
//! Sessions that emit typed records skip those stages and go through the
//! structured adapter instead. Both paths fill the same [`Transcript`].

use crate::config::IdleSignals;

pub mod assembler;
pub mod classifier;
pub mod diff;
pub mod merge;
pub mod segmenter;
pub mod session;
pub mod structured;

#[cfg(test)]
mod structured_tests;
#[cfg(test)]
mod test_utils;

pub use assembler::{ChunkAssembler, NormalizedText, PositionHint};
pub use classifier::{LineClassifier, LineSignature};
pub use diff::{diff_stats, parse_diff, DiffLine, DiffLineKind, DiffStats};
pub use merge::merge;
pub use segmenter::{SegmentationResult, Segmenter};
pub use session::{SessionParser, StructuredSession, Transcript};
pub use structured::{Adapted, BlockUpdate, StructuredAdapter, StructuredEvent};

/// How a session delivers its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Terminal output of an interactive session
    RawText,
    /// Newline-delimited JSON records
    Structured,
}

/// Common interface of the two ingestion paths
pub trait TranscriptSession: Send {
    /// Feed the next chunk of session output
    fn ingest(&mut self, chunk: &[u8]);

    /// The stream ended; finalize whatever is still open
    fn finish(&mut self);

    /// The session restarted; drop all state
    fn reset(&mut self);

    fn transcript(&self) -> &Transcript;
}

impl TranscriptSession for SessionParser {
    fn ingest(&mut self, chunk: &[u8]) {
        self.feed(chunk);
    }

    fn finish(&mut self) {
        SessionParser::finish(self);
    }

    fn reset(&mut self) {
        SessionParser::reset(self);
    }

    fn transcript(&self) -> &Transcript {
        SessionParser::transcript(self)
    }
}

impl TranscriptSession for StructuredSession {
    fn ingest(&mut self, chunk: &[u8]) {
        self.feed(chunk);
    }

    fn finish(&mut self) {
        StructuredSession::finish(self);
    }

    fn reset(&mut self) {
        StructuredSession::reset(self);
    }

    fn transcript(&self) -> &Transcript {
        StructuredSession::transcript(self)
    }
}

/// Create the session parser for the given ingestion mode
pub fn create_session(mode: IngestMode, signals: IdleSignals) -> Box<dyn TranscriptSession> {
    match mode {
        IngestMode::RawText => Box::new(SessionParser::new(signals)),
        IngestMode::Structured => Box::new(StructuredSession::new()),
    }
}
