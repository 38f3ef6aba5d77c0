use std::io;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the `-v` count selects the level.
/// Logs go to stderr unless `to_stdout` is set, so that block output written
/// to stdout stays machine-readable.
pub fn setup_logging(verbose_level: u8, to_stdout: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::new(filter_directives(verbose_level))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_level(true);

    let subscriber: SubscriberBuilder<_, _, _, fn() -> Box<dyn io::Write + Send>> = if to_stdout {
        subscriber.with_writer(|| Box::new(std::io::stdout()) as Box<dyn io::Write + Send>)
    } else {
        subscriber.with_writer(|| Box::new(std::io::stderr()) as Box<dyn io::Write + Send>)
    };

    // A subscriber installed by an embedding application wins
    let _ = subscriber.try_init();
}

/// Map the verbosity count to filter directives
fn filter_directives(verbose_level: u8) -> &'static str {
    match verbose_level {
        0 => "warn,session_transcript=info",
        1 => "info,session_transcript=debug",
        _ => "debug,session_transcript=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(filter_directives(0), "warn,session_transcript=info");
        assert_eq!(filter_directives(1), "info,session_transcript=debug");
        assert_eq!(filter_directives(2), "debug,session_transcript=trace");
        assert_eq!(filter_directives(7), "debug,session_transcript=trace");
    }

    #[test]
    fn test_setup_twice_does_not_panic() {
        setup_logging(0, false);
        setup_logging(2, true);
    }
}
