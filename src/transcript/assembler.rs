//! Chunk assembly and terminal control-sequence normalization
//!
//! PTY output arrives in chunks that carry no alignment guarantees: an escape
//! sequence, a UTF-8 code point or a line can be split at any byte. The
//! `vte` parser keeps partial escape sequences and code points across calls,
//! and the assembler keeps the partial line, so feeding a stream in pieces
//! yields the same text as feeding it at once.

use tracing::trace;
use vte::{Params, Parser, Perform};

/// Cursor and screen operations that were removed from the text.
///
/// `line` is the number of complete lines emitted by the same `feed` call
/// before the operation was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionHint {
    pub line: usize,
    pub kind: HintKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    /// Cursor returned to column 0 and the line was overwritten
    CarriageReturn,
    /// Erase-in-line cleared the current line
    LineErased,
    /// Cursor moved up this many rows (redraw of earlier output)
    CursorUp(u16),
    /// Cursor moved down this many rows
    CursorDown(u16),
    /// Absolute cursor positioning
    CursorPosition,
    /// Erase-in-display
    ScreenCleared,
}

/// Plain text produced from one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Complete lines, each terminated by `\n`
    pub text: String,
    pub hints: Vec<PositionHint>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Iterate the complete lines without their terminators
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split_terminator('\n')
    }
}

/// `vte::Perform` implementation that turns terminal output into lines
#[derive(Debug, Default)]
struct Normalizer {
    /// Current, not yet terminated line
    line: String,
    /// A bare `\r` was seen; the next printable character rewinds the line
    pending_cr: bool,
    /// Output of the current feed call
    out: NormalizedText,
    emitted_lines: usize,
}

impl Normalizer {
    fn hint(&mut self, kind: HintKind) {
        self.out.hints.push(PositionHint {
            line: self.emitted_lines,
            kind,
        });
    }

    fn rewind_if_pending(&mut self) {
        if self.pending_cr {
            self.pending_cr = false;
            if !self.line.is_empty() {
                self.line.clear();
                self.hint(HintKind::CarriageReturn);
            }
        }
    }

    fn end_line(&mut self) {
        self.pending_cr = false;
        self.out.text.push_str(&self.line);
        self.out.text.push('\n');
        self.line.clear();
        self.emitted_lines += 1;
    }

    fn take_output(&mut self) -> NormalizedText {
        self.emitted_lines = 0;
        std::mem::take(&mut self.out)
    }
}

fn first_param(params: &Params, default: u16) -> u16 {
    params
        .iter()
        .next()
        .and_then(|values| values.first().copied())
        .filter(|value| *value != 0)
        .unwrap_or(default)
}

impl Perform for Normalizer {
    fn print(&mut self, c: char) {
        self.rewind_if_pending();
        self.line.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => self.end_line(),
            b'\r' => self.pending_cr = true,
            b'\t' => {
                self.rewind_if_pending();
                self.line.push('\t');
            }
            0x08 => {
                self.line.pop();
            }
            _ => {} // Bell, shift in/out and other C0 controls carry no text
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        if !intermediates.is_empty() {
            return;
        }
        match action {
            'K' => {
                let mode = params
                    .iter()
                    .next()
                    .and_then(|values| values.first().copied())
                    .unwrap_or(0);
                // Erasing from the cursor to the end is a no-op unless the
                // cursor was rewound to column 0.
                if mode == 2 || self.pending_cr {
                    self.pending_cr = false;
                    if !self.line.is_empty() {
                        self.line.clear();
                        self.hint(HintKind::LineErased);
                    }
                }
            }
            'C' => {
                self.rewind_if_pending();
                let count = first_param(params, 1) as usize;
                self.line.extend(std::iter::repeat(' ').take(count));
            }
            'A' | 'F' => self.hint(HintKind::CursorUp(first_param(params, 1))),
            'B' | 'E' => self.hint(HintKind::CursorDown(first_param(params, 1))),
            'H' | 'f' | 'G' | 'd' | 'D' => self.hint(HintKind::CursorPosition),
            'J' => self.hint(HintKind::ScreenCleared),
            _ => {} // SGR colors, private modes, scroll regions
        }
    }

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}

/// Buffers arbitrarily fragmented PTY chunks into normalized lines
pub struct ChunkAssembler {
    parser: Parser,
    normalizer: Normalizer,
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            normalizer: Normalizer::default(),
        }
    }

    /// Normalize a raw chunk and return the lines it completed
    pub fn feed(&mut self, raw: &[u8]) -> NormalizedText {
        self.parser.advance(&mut self.normalizer, raw);
        let out = self.normalizer.take_output();
        trace!(
            "Assembled {} bytes into {} complete bytes, {} pending",
            raw.len(),
            out.text.len(),
            self.normalizer.line.len()
        );
        out
    }

    /// Emit the partial line, if any, as a complete line.
    ///
    /// Used when the stream ends or goes quiet. An incomplete escape
    /// sequence stays buffered because it never contributes text.
    pub fn flush(&mut self) -> NormalizedText {
        if !self.normalizer.line.is_empty() {
            self.normalizer.end_line();
        }
        self.normalizer.pending_cr = false;
        self.normalizer.take_output()
    }

    /// Text of the line that has not been terminated yet
    pub fn partial_line(&self) -> &str {
        &self.normalizer.line
    }

    /// Whether any partial line is buffered
    pub fn has_remainder(&self) -> bool {
        !self.normalizer.line.is_empty() || self.normalizer.pending_cr
    }

    /// Drop the partial line and any incomplete escape or UTF-8 sequence
    pub fn reset(&mut self) {
        self.parser = Parser::new();
        self.normalizer = Normalizer::default();
    }
}
