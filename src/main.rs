mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use session_transcript::logging::setup_logging;
use session_transcript::recording::{PtyRecording, ReplayTiming};
use session_transcript::transcript::diff::diff_stats;
use session_transcript::{create_session, Block, BlockKind, IngestMode, ParserSettings};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::cli::{Args, InputFormat};

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_settings(path: Option<&Path>) -> Result<ParserSettings> {
    let settings = match path {
        Some(path) => ParserSettings::load_from(path),
        None => ParserSettings::load(),
    };
    settings.context("Failed to load parser settings")
}

fn describe(block: &Block) -> String {
    let mut header = format!("[{}] {}", block.id, block.kind);
    if let Some(tool_name) = &block.tool_name {
        header.push_str(&format!(" {tool_name}"));
    }
    if let Some(file_path) = &block.file_path {
        header.push_str(&format!(" {file_path}"));
    }
    if let Some(status) = block.execution_status {
        header.push_str(&format!(" ({status:?})"));
    }
    if block.kind == BlockKind::Diff {
        let stats = diff_stats(&block.diff_lines());
        header.push_str(&format!(" +{} -{}", stats.additions, stats.deletions));
    }
    header
}

fn print_blocks(blocks: &[Block], json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, blocks)?;
        writeln!(out)?;
        return Ok(());
    }
    for block in blocks {
        writeln!(out, "{}", describe(block))?;
        for line in block.content.lines() {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose, false);

    let settings = load_settings(args.settings.as_deref())?;
    let signals = settings.compile().context("Invalid parser settings")?;

    let mode = match args.format {
        InputFormat::Events => IngestMode::Structured,
        InputFormat::Raw | InputFormat::Recording => IngestMode::RawText,
    };
    let mut session = create_session(mode, signals);

    match args.format {
        InputFormat::Recording => {
            let recording = PtyRecording::from_file(&args.input)?;
            let timing = if args.realtime {
                ReplayTiming::Recorded
            } else {
                ReplayTiming::Fast
            };
            recording.replay_into(session.as_mut(), timing, |session| {
                debug!("{} blocks after chunk", session.transcript().len());
            });
        }
        InputFormat::Raw | InputFormat::Events => {
            let input = read_input(&args.input)?;
            for chunk in input.chunks(args.chunk_size.max(1)) {
                session.ingest(chunk);
            }
            session.finish();
        }
    }

    let transcript = session.transcript();
    info!("Parsed {} blocks", transcript.blocks().len());
    let blocks = if args.merge {
        transcript.merged()
    } else {
        transcript.blocks().to_vec()
    };
    print_blocks(&blocks, args.json)
}
