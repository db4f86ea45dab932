//! File log sink
//!
//! Writes one line per event as `YYYY-MM-DD HH:MM:SS | LEVEL | message` and
//! keeps the file below a fixed size by deleting it before a pass.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Largest log file kept between passes (5 MiB)
pub const MAX_LOG_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Delete `path` when it is larger than `max_bytes`
///
/// Returns true when the file was removed. Errors are ignored.
pub fn enforce_size_limit(path: &Path, max_bytes: u64) -> bool {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.len() > max_bytes => std::fs::remove_file(path).is_ok(),
        _ => false,
    }
}

/// Opens the log file in append mode for every event
///
/// The file may be deleted between writes; the next event recreates it.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Writer returned by [`LogFile`]; a file that cannot be opened drops output
pub struct LogFileWriter {
    file: Option<File>,
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(file) = self.file.as_mut() {
            if file.write_all(buf).is_err() {
                self.file = None;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .ok();
        LogFileWriter { file }
    }
}

/// `timestamp | LEVEL | message` event format
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeFormat;

impl<S, N> FormatEvent<S, N> for PipeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level().to_string();
        write!(writer, "{} | {:<5} | ", timestamp, level)?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// The file sink layer type for a subscriber `S`
pub type FileLayer<S> = tracing_subscriber::fmt::Layer<S, DefaultFields, PipeFormat, LogFile>;

/// Build the file sink layer for a subscriber
pub fn file_layer<S>(path: PathBuf) -> FileLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .event_format(PipeFormat)
        .with_writer(LogFile::new(path))
        .with_ansi(false)
}
