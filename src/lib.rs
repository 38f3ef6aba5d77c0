//! Streaming parser for the terminal transcript of an interactive assistant
//! CLI session.
//!
//! Raw PTY chunks go into a [`SessionParser`], which turns them into typed
//! [`Block`]s: assistant prose, tool invocations and their results, diffs,
//! reasoning, permission prompts, status lines and errors. Sessions that
//! emit typed JSON records use a [`StructuredSession`] instead.

pub mod config;
pub mod error;
pub mod logging;
pub mod recording;
pub mod transcript;
pub mod types;

pub use config::{IdleSignals, ParserSettings};
pub use error::{Result, TranscriptError};
pub use transcript::{
    create_session, IngestMode, SessionParser, StructuredSession, Transcript, TranscriptSession,
};
pub use types::{Block, BlockId, BlockKind, ExecutionStatus};
