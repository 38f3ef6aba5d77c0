use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::transcript::TranscriptSession;

/// Captured terminal output of one session, chunk by chunk
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PtyRecording {
    /// Command line of the recorded process, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Timestamp of when the recording was started
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Raw chunks as read from the PTY
    pub chunks: Vec<RecordedChunk>,
}

/// Single recorded chunk with timing info
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordedChunk {
    /// Chunk content, escape sequences included
    pub data: String,
    /// Milliseconds since recording start
    pub timestamp_ms: u64,
}

/// How fast a recording is replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayTiming {
    /// Feed all chunks back to back
    Fast,
    /// Sleep between chunks as recorded
    Recorded,
}

impl PtyRecording {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path.as_ref()).context("Failed to read recording file")?;
        serde_json::from_str(&contents).context("Failed to parse recording file")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json).context("Failed to write recording file")?;
        Ok(())
    }

    /// Feed every chunk into the session in order, then finish it.
    ///
    /// `on_chunk` runs after each chunk, the way a UI would re-render.
    pub fn replay_into(
        &self,
        session: &mut dyn TranscriptSession,
        timing: ReplayTiming,
        mut on_chunk: impl FnMut(&dyn TranscriptSession),
    ) {
        let mut last_ms = 0;
        for chunk in &self.chunks {
            if timing == ReplayTiming::Recorded {
                let delay = chunk.timestamp_ms.saturating_sub(last_ms);
                if delay > 0 {
                    std::thread::sleep(Duration::from_millis(delay));
                }
            }
            last_ms = chunk.timestamp_ms;
            session.ingest(chunk.data.as_bytes());
            on_chunk(&*session);
        }
        session.finish();
        debug!("Replayed {} chunks", self.chunks.len());
    }
}

/// Records PTY chunks with their arrival time
pub struct PtyRecorder {
    recording: PtyRecording,
    start_time: Instant,
    /// Leading bytes of a code point split across reads
    pending: Vec<u8>,
}

impl PtyRecorder {
    pub fn start(command: Option<String>) -> Self {
        Self {
            recording: PtyRecording {
                command,
                timestamp: chrono::Utc::now(),
                chunks: Vec::new(),
            },
            start_time: Instant::now(),
            pending: Vec::new(),
        }
    }

    /// Record an incoming chunk.
    ///
    /// A code point cut off at the end of the chunk is held back and recorded
    /// with the next chunk; other invalid UTF-8 is replaced.
    pub fn record_chunk(&mut self, data: &[u8]) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.pending.extend_from_slice(data);
        let complete = complete_prefix_len(&self.pending);
        let tail = self.pending.split_off(complete);
        let bytes = std::mem::replace(&mut self.pending, tail);
        if !bytes.is_empty() {
            self.push(String::from_utf8_lossy(&bytes).into_owned(), timestamp_ms);
        }
    }

    /// Record a chunk with an explicit timestamp
    pub fn record_chunk_at(&mut self, data: &str, timestamp_ms: u64) {
        self.flush_pending(timestamp_ms);
        self.push(data.to_string(), timestamp_ms);
    }

    pub fn finish(mut self) -> PtyRecording {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.flush_pending(timestamp_ms);
        self.recording
    }

    fn flush_pending(&mut self, timestamp_ms: u64) {
        if !self.pending.is_empty() {
            let bytes = std::mem::take(&mut self.pending);
            self.push(String::from_utf8_lossy(&bytes).into_owned(), timestamp_ms);
        }
    }

    fn push(&mut self, data: String, timestamp_ms: u64) {
        self.recording.chunks.push(RecordedChunk { data, timestamp_ms });
    }
}

/// Length of `bytes` without a trailing, incomplete UTF-8 sequence
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let start = bytes.len().saturating_sub(3);
    for (i, &byte) in bytes.iter().enumerate().skip(start).rev() {
        // Continuation byte, keep looking for the lead byte
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if bytes.len() - i < width { i } else { bytes.len() };
    }
    bytes.len()
}
