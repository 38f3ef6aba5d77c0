use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Raw terminal capture (escape sequences included)
    Raw,
    /// JSON recording with timed chunks
    Recording,
    /// Newline-delimited structured event records
    Events,
}

/// Replay captured session output through the transcript parser
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input file, or "-" for stdin
    pub input: PathBuf,

    /// Format of the input
    #[arg(short, long, default_value = "raw")]
    pub format: InputFormat,

    /// Feed raw input in chunks of this many bytes
    #[arg(long, default_value_t = 4096)]
    pub chunk_size: usize,

    /// Honour the recorded timing when replaying a recording
    #[arg(long)]
    pub realtime: bool,

    /// Coalesce adjacent text blocks before printing
    #[arg(long)]
    pub merge: bool,

    /// Print blocks as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to parser settings (defaults to ~/.config/session-transcript/settings.json)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args_parsing() {
        let args = Args::try_parse_from(["test", "capture.log"]).expect("Failed to parse default args");

        assert_eq!(args.input, PathBuf::from("capture.log"));
        assert_eq!(args.format, InputFormat::Raw);
        assert_eq!(args.chunk_size, 4096);
        assert_eq!(args.verbose, 0);
        assert!(!args.merge);
        assert!(!args.json);
        assert!(!args.realtime);
        assert!(args.settings.is_none());
    }

    #[test]
    fn test_verbose_flag_counting() {
        let args = Args::try_parse_from(["test", "-vv", "in.log"]).expect("Failed to parse verbose args");
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_format_and_flags() {
        let args = Args::try_parse_from([
            "test",
            "--format",
            "events",
            "--merge",
            "--json",
            "--chunk-size",
            "7",
            "events.jsonl",
        ])
        .expect("Failed to parse args");
        assert_eq!(args.format, InputFormat::Events);
        assert!(args.merge);
        assert!(args.json);
        assert_eq!(args.chunk_size, 7);
    }

    #[test]
    fn test_input_is_required() {
        assert!(Args::try_parse_from(["test"]).is_err());
    }
}
