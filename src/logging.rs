use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use std::path::Path;

const LOG_BASENAME: &str = "btts-client";

/// Start the file logger for the client.
///
/// Debug builds (or `verbose`) log at `debug` to file and stderr, honouring
/// `RUST_LOG`. Release builds only keep errors, rotated at 10MB.
/// The returned handle must stay alive for buffered output to be flushed.
pub fn init(log_dir: &Path, verbose: bool) -> Result<LoggerHandle, Box<dyn std::error::Error>> {
    let file_spec = FileSpec::default()
        .directory(log_dir)
        .basename(LOG_BASENAME);

    let logger = if cfg!(debug_assertions) || verbose {
        Logger::try_with_env_or_str("debug")?
            .log_to_file(file_spec)
            .duplicate_to_stderr(Duplicate::All)
    } else {
        Logger::try_with_str("error")?
            .log_to_file(file_spec)
            .rotate(
                Criterion::Size(10_000_000),
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
    };

    let handle = logger.write_mode(WriteMode::BufferAndFlush).start()?;
    Ok(handle)
}
