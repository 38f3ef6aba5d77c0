use crate::error::{Result, TranscriptError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Get the directory holding the parser settings
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TranscriptError::Config("Could not determine home directory".into()))?;
    Ok(home.join(".config").join("session-transcript"))
}

/// Parser settings loaded from ~/.config/session-transcript/settings.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Lines consisting only of one of these markers mean the session is idle
    pub idle_prompt_markers: Vec<String>,
    /// Additional regexes; a matching line is an idle signal
    pub idle_patterns: Vec<String>,
    /// Number of consecutive blank lines that count as an idle signal
    pub idle_blank_lines: usize,
    /// Split open blocks that grow beyond this many bytes
    pub max_block_bytes: Option<usize>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            idle_prompt_markers: vec!["❯".to_string(), ">".to_string(), "›".to_string()],
            idle_patterns: Vec::new(),
            idle_blank_lines: 2,
            max_block_bytes: None,
        }
    }
}

impl ParserSettings {
    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join("settings.json");
        Self::load_from(&path)
    }

    /// Load settings from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|err| {
            tracing::warn!("Failed to read settings from {}: {err}", path.display());
            err
        })?;

        serde_json::from_str(&contents).map_err(|err| {
            tracing::warn!("Failed to parse settings from {}: {err}", path.display());
            TranscriptError::Config(format!("{}: {err}", path.display()))
        })
    }

    /// Validate the settings and compile the idle signal set
    pub fn compile(&self) -> Result<IdleSignals> {
        let patterns = self
            .idle_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| TranscriptError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if self.max_block_bytes == Some(0) {
            return Err(TranscriptError::Config(
                "max_block_bytes must be greater than zero".into(),
            ));
        }

        Ok(IdleSignals {
            prompt_markers: self
                .idle_prompt_markers
                .iter()
                .map(|marker| marker.trim().to_string())
                .filter(|marker| !marker.is_empty())
                .collect(),
            patterns,
            blank_lines: self.idle_blank_lines.max(1),
            max_block_bytes: self.max_block_bytes,
        })
    }
}

/// Compiled form of [`ParserSettings`] used by the segmenter
#[derive(Debug, Clone)]
pub struct IdleSignals {
    prompt_markers: Vec<String>,
    patterns: Vec<Regex>,
    blank_lines: usize,
    max_block_bytes: Option<usize>,
}

impl Default for IdleSignals {
    fn default() -> Self {
        Self {
            prompt_markers: vec!["❯".to_string(), ">".to_string(), "›".to_string()],
            patterns: Vec::new(),
            blank_lines: 2,
            max_block_bytes: None,
        }
    }
}

impl IdleSignals {
    /// Whether a non-blank line is a session-idle signal.
    ///
    /// Prompt markers only count at column 0; an indented `>` is content.
    pub fn is_idle_line(&self, line: &str) -> bool {
        let trimmed = line.trim_end();
        if self.prompt_markers.iter().any(|marker| marker == trimmed) {
            return true;
        }
        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }

    pub fn blank_lines(&self) -> usize {
        self.blank_lines
    }

    pub fn max_block_bytes(&self) -> Option<usize> {
        self.max_block_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_compile() {
        let signals = ParserSettings::default().compile().unwrap();
        assert!(signals.is_idle_line("❯"));
        assert!(signals.is_idle_line(">  "));
        assert!(!signals.is_idle_line("  >"));
        assert!(!signals.is_idle_line(" ❯"));
        assert!(!signals.is_idle_line("> quoted text"));
        assert_eq!(signals.blank_lines(), 2);
    }

    #[test]
    fn test_custom_patterns_are_idle_signals() {
        let settings = ParserSettings {
            idle_patterns: vec![r"^\$ $".to_string()],
            ..Default::default()
        };
        let signals = settings.compile().unwrap();
        assert!(signals.is_idle_line("$ "));
        assert!(!signals.is_idle_line("$ ls"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let settings = ParserSettings {
            idle_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        let err = settings.compile().unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidPattern { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_blank_line_threshold_is_clamped() {
        let settings = ParserSettings {
            idle_blank_lines: 0,
            ..Default::default()
        };
        assert_eq!(settings.compile().unwrap().blank_lines(), 1);
    }

    #[test]
    fn test_zero_block_cap_is_rejected() {
        let settings = ParserSettings {
            max_block_bytes: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            settings.compile(),
            Err(TranscriptError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ParserSettings::load_from(&dir.path().join("missing.json")).unwrap();
        assert_eq!(settings, ParserSettings::default());
    }

    #[test]
    fn test_load_from_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"idle_blank_lines": 3}}"#).unwrap();

        let settings = ParserSettings::load_from(&path).unwrap();
        assert_eq!(settings.idle_blank_lines, 3);
        assert_eq!(settings.idle_prompt_markers, vec!["❯", ">", "›"]);
    }

    #[test]
    fn test_load_from_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ParserSettings::load_from(&path),
            Err(TranscriptError::Config(_))
        ));
    }
}
