//! Example script to create a sample PTY recording
//!
//! The recording holds a short session with a tool call, a diff, a
//! permission prompt and a closing answer, split at awkward chunk
//! boundaries. Replay it with:
//!
//! ```text
//! transcript-replay --format recording sample_recording.json
//! ```

use session_transcript::recording::PtyRecorder;

fn main() -> anyhow::Result<()> {
    let mut recorder = PtyRecorder::start(Some("claude".to_string()));

    let chunks: &[(&str, u64)] = &[
        ("\x1b[?25l\x1b[2K\r✻ Pondering…", 0),
        ("\r\x1b[2K", 120),
        ("I'll update the greeting.\r\n\r\n", 180),
        ("\x1b[1m⏺\x1b[0m Update(src/ma", 400),
        ("in.rs)\r\n", 420),
        ("  ⎿  Updated src/main.rs with 1 addition and 1 removal\r\n", 650),
        ("@@ -1,3 +1,3 @@\r\n fn main() {\r\n-    println!(\"Hello\");\r\n", 700),
        ("+    println!(\"Hello, world!\");\r\n }\r\n\r\n", 720),
        ("╭──────────────────────────────╮\r\n", 900),
        ("│ Do you want to proceed?      │\r\n", 905),
        ("│ ❯ 1. Yes                     │\r\n", 910),
        ("╰──────────────────────────────╯\r\n\r\n", 915),
        ("⏺ Bash(cargo run)\r\n", 1500),
        ("  ⎿  Hello, world!\r\n\r\n", 2300),
        ("The program now prints the full greeting.\r\n", 2500),
        ("\r\n❯ ", 2600),
    ];
    for (data, timestamp_ms) in chunks {
        recorder.record_chunk_at(data, *timestamp_ms);
    }

    let file_path = "sample_recording.json";
    recorder.finish().save(file_path)?;

    println!("Sample recording file created: {}", file_path);
    Ok(())
}
