//! Line-level view of unified diff content

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    Add,
    Remove,
    Context,
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Line text without its marker; header lines keep their full text
    pub content: String,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
}

impl DiffLine {
    fn header(content: &str) -> Self {
        Self {
            kind: DiffLineKind::Header,
            content: content.to_string(),
            old_line: None,
            new_line: None,
        }
    }

    /// The number shown next to the line: the new-file counter for additions
    /// and context, the old-file counter for removals, none for headers.
    pub fn line_number(&self) -> Option<u32> {
        match self.kind {
            DiffLineKind::Add | DiffLineKind::Context => self.new_line,
            DiffLineKind::Remove => self.old_line,
            DiffLineKind::Header => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
}

/// Running counters of the current hunk
#[derive(Debug)]
struct Hunk {
    old: u32,
    new: u32,
    old_remaining: u32,
    new_remaining: u32,
}

impl Hunk {
    fn expects_lines(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    fn take_old(&mut self) -> u32 {
        self.old = self.old.saturating_add(1);
        self.old_remaining = self.old_remaining.saturating_sub(1);
        self.old
    }

    fn take_new(&mut self) -> u32 {
        self.new = self.new.saturating_add(1);
        self.new_remaining = self.new_remaining.saturating_sub(1);
        self.new
    }
}

fn hunk_header_regex() -> &'static Regex {
    static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();
    HUNK_HEADER.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid regex")
    })
}

fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let caps = hunk_header_regex().captures(line)?;
    let number = |index: usize, default: u32| -> Option<u32> {
        match caps.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };
    let old_start = number(1, 0)?;
    let old_count = number(2, 1)?;
    let new_start = number(3, 0)?;
    let new_count = number(4, 1)?;
    Some(Hunk {
        old: old_start.saturating_sub(1),
        new: new_start.saturating_sub(1),
        old_remaining: old_count,
        new_remaining: new_count,
    })
}

/// Parse unified diff content into numbered lines.
///
/// Pure and total: lines that fit no diff shape become context, so every
/// input yields a result.
pub fn parse_diff(content: &str) -> Vec<DiffLine> {
    let mut hunk: Option<Hunk> = None;
    let mut lines = Vec::new();

    for line in content.lines() {
        if line.starts_with("@@") {
            if let Some(parsed) = parse_hunk_header(line) {
                hunk = Some(parsed);
            }
            lines.push(DiffLine::header(line));
            continue;
        }

        if line.starts_with('\\') {
            // "\ No newline at end of file"
            lines.push(DiffLine::header(line));
            continue;
        }

        let in_hunk_body = hunk.as_ref().is_some_and(Hunk::expects_lines);
        if !in_hunk_body && (line.starts_with("--- ") || line.starts_with("+++ ")) {
            lines.push(DiffLine::header(line));
            continue;
        }

        let diff_line = if let Some(rest) = line.strip_prefix('+') {
            DiffLine {
                kind: DiffLineKind::Add,
                content: rest.to_string(),
                old_line: None,
                new_line: hunk.as_mut().map(Hunk::take_new),
            }
        } else if let Some(rest) = line.strip_prefix('-') {
            DiffLine {
                kind: DiffLineKind::Remove,
                content: rest.to_string(),
                old_line: hunk.as_mut().map(Hunk::take_old),
                new_line: None,
            }
        } else {
            let rest = line.strip_prefix(' ').unwrap_or(line);
            let (old_line, new_line) = match hunk.as_mut() {
                Some(h) => (Some(h.take_old()), Some(h.take_new())),
                None => (None, None),
            };
            DiffLine {
                kind: DiffLineKind::Context,
                content: rest.to_string(),
                old_line,
                new_line,
            }
        };
        lines.push(diff_line);
    }

    lines
}

/// Count additions and deletions of parsed diff lines
pub fn diff_stats(lines: &[DiffLine]) -> DiffStats {
    lines.iter().fold(DiffStats::default(), |mut stats, line| {
        match line.kind {
            DiffLineKind::Add => stats.additions += 1,
            DiffLineKind::Remove => stats.deletions += 1,
            DiffLineKind::Context | DiffLineKind::Header => {}
        }
        stats
    })
}
