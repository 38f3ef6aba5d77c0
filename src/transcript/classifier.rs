//! Line classifiers for the assistant CLI's terminal output
//!
//! Each recognizer looks at one normalized line in isolation. The checks run
//! in a fixed priority order so that a line matching several signatures
//! always resolves the same way:
//!
//! ```text
//! trust_prompt > tool_result > tool_call > diff > error > status > thinking > text
//! ```
//!
//! Lines that match nothing are plain text (`classify` returns `None`).

use regex::Regex;
use tracing::trace;

use crate::types::BlockKind;

/// Decorative characters of boxed banners, trimmed before banner matching
const BOX_CHARS: &[char] = &[
    '│', '─', '┌', '┐', '┘', '└', '├', '┤', '┬', '┴', '┼', '╭', '╮', '╯', '╰', '║', '═', '╔',
    '╗', '╚', '╝', '┃', '━',
];

/// Permission and workspace-trust banner phrases (matched lowercase)
const TRUST_PHRASES: &[&str] = &[
    "do you trust the files in this folder",
    "do you trust this project",
    "quick safety check",
    "do you want to proceed",
    "do you want to make this edit",
    "do you want to create",
    "do you want to allow",
    "permission required",
    "security check",
    "allow this command",
];

/// Result text prefixes that mark a failed tool execution
const FAILURE_PREFIXES: &[&str] = &[
    "Error",
    "Failed",
    "Denied",
    "Interrupted",
    "User rejected",
    "Permission denied",
    "No such file",
];

/// Tools whose first argument is a file path
const FILE_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Update",
    "Create",
    "NotebookEdit",
    "NotebookRead",
];

/// What a single line announces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSignature {
    TrustPrompt,
    ToolResult {
        failed: bool,
    },
    ToolCall {
        tool_name: String,
        file_path: Option<String>,
    },
    DiffHeader,
    Error,
    Status,
    Thinking,
}

impl LineSignature {
    /// Kind of block this signature opens
    pub fn kind(&self) -> BlockKind {
        match self {
            LineSignature::TrustPrompt => BlockKind::TrustPrompt,
            LineSignature::ToolResult { .. } => BlockKind::ToolResult,
            LineSignature::ToolCall { .. } => BlockKind::ToolCall,
            LineSignature::DiffHeader => BlockKind::Diff,
            LineSignature::Error => BlockKind::Error,
            LineSignature::Status => BlockKind::Status,
            LineSignature::Thinking => BlockKind::Thinking,
        }
    }

    /// Signatures that always start a new block, even on indented lines
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            LineSignature::TrustPrompt
                | LineSignature::ToolResult { .. }
                | LineSignature::ToolCall { .. }
        )
    }
}

pub struct LineClassifier {
    tool_result_regex: Regex, // "  ⎿  Read 12 lines"
    tool_call_regex: Regex,   // "⏺ Read(src/main.rs)"
    hunk_header_regex: Regex, // "@@ -1,2 +1,3 @@"
    file_header_regex: Regex, // "--- a/src/lib.rs"
    error_regex: Regex,       // "Error: ...", "✗ ..."
    spinner_regex: Regex,     // "✻ Kneading…", "✻ Baked for 7m 11s"
    thinking_regex: Regex,    // "∴ Thinking…", "<thinking>"
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            tool_result_regex: Regex::new(r"^\s*⎿\s*(.*)$").expect("valid regex"),
            tool_call_regex: Regex::new(r"^\s*[⏺●]\s*([A-Za-z][A-Za-z0-9_\-.:]*) ?\((.*)$")
                .expect("valid regex"),
            hunk_header_regex: Regex::new(r"^@@ -\d+(?:,\d+)? \+\d+(?:,\d+)? @@")
                .expect("valid regex"),
            file_header_regex: Regex::new(r"^(?:--- (?:a/|/dev/null)|\+\+\+ (?:b/|/dev/null))")
                .expect("valid regex"),
            error_regex: Regex::new(r"^(?:Error:|error:|API Error|[✗✘])").expect("valid regex"),
            spinner_regex: Regex::new(r"^\s*[✻✽✶✳✢·*]\s+(?:\S+…|\S+\s+for\s+\d)")
                .expect("valid regex"),
            thinking_regex: Regex::new(r"^\s*(?:[∴✻]\s*Thinking|[Tt]hinking…|</?thinking>)")
                .expect("valid regex"),
        }
    }

    /// Classify one normalized line (without its terminator)
    pub fn classify(&self, line: &str) -> Option<LineSignature> {
        let signature = self.match_line(line);
        trace!("Classified {:?} as {:?}", line, signature);
        signature
    }

    fn match_line(&self, line: &str) -> Option<LineSignature> {
        if self.is_trust_banner(line) {
            return Some(LineSignature::TrustPrompt);
        }

        if let Some(caps) = self.tool_result_regex.captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            return Some(LineSignature::ToolResult {
                failed: signals_failure(text),
            });
        }

        if let Some(caps) = self.tool_call_regex.captures(line) {
            let tool_name = caps[1].to_string();
            let arguments = caps.get(2).map_or("", |m| m.as_str());
            let file_path = if FILE_TOOLS.contains(&tool_name.as_str()) {
                first_argument(arguments)
            } else {
                None
            };
            return Some(LineSignature::ToolCall {
                tool_name,
                file_path,
            });
        }

        if self.hunk_header_regex.is_match(line) || self.file_header_regex.is_match(line) {
            return Some(LineSignature::DiffHeader);
        }

        if self.error_regex.is_match(line) {
            return Some(LineSignature::Error);
        }

        if self.spinner_regex.is_match(line)
            || line.contains("esc to interrupt")
            || line.contains("⏵⏵")
        {
            return Some(LineSignature::Status);
        }

        if self.thinking_regex.is_match(line) {
            return Some(LineSignature::Thinking);
        }

        None
    }

    fn is_trust_banner(&self, line: &str) -> bool {
        let inner = trim_box_chars(line);
        if inner.is_empty() {
            return false;
        }
        let lowered = inner.to_lowercase();
        TRUST_PHRASES.iter().any(|phrase| lowered.contains(phrase))
    }
}

/// Strip decorative box-drawing borders and surrounding whitespace
pub fn trim_box_chars(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || BOX_CHARS.contains(&c))
}

/// Line drawn inside or on the border of a box
pub fn is_box_framed(line: &str) -> bool {
    line.trim_start().starts_with(BOX_CHARS)
}

/// Two or more leading spaces, or a leading tab
pub fn is_indented(line: &str) -> bool {
    line.starts_with("  ") || line.starts_with('\t')
}

/// Lines that may appear inside a unified diff body
pub fn is_diff_shaped(line: &str) -> bool {
    line.starts_with(['+', '-', ' ', '\\']) || line.starts_with("@@")
}

fn signals_failure(result_text: &str) -> bool {
    let text = result_text.trim_start();
    FAILURE_PREFIXES
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

/// First argument of a tool invocation, without a `key=` prefix or quotes
fn first_argument(arguments: &str) -> Option<String> {
    let arguments = arguments.trim_end().strip_suffix(')').unwrap_or(arguments);
    let first = arguments.split(", ").next()?.trim();
    let value = match first.split_once('=') {
        Some((key, value)) if key.chars().all(|c| c.is_alphanumeric() || c == '_') => value,
        _ => first,
    };
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
