use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{Layer, filter::LevelFilter, fmt, prelude::*, registry::LookupSpan};

/// The log file always keeps the per-structure summaries, even under `-q`.
const FILE_MIN_LEVEL: LevelFilter = LevelFilter::INFO;

fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn file_level(verbosity: u8) -> LevelFilter {
    console_level(verbosity, false).max(FILE_MIN_LEVEL)
}

fn console_layer<S>(level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(level)
}

fn file_layer<S>(file: File, level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(level)
}

/// Installs the global subscriber.
///
/// Console output follows `-v`/`-q`. The optional log file records at least
/// INFO, so a quiet batch run still leaves one line per labeled structure.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let file = log_file
        .map(|path| File::create(&path).map_err(CliError::Io))
        .transpose()?;

    tracing_subscriber::registry()
        .with(console_layer(console_level(verbosity, quiet)))
        .with(file.map(|f| file_layer(f, file_level(verbosity))))
        .init();

    Ok(())
}
