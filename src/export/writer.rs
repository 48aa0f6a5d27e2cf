//! Output sink and banner sections.
//!
//! Each table acquires the dump file once, in append mode, and writes its
//! opening banner, its INSERT lines and its closing banner through the same
//! handle before releasing it.

use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// `-- ***…*** --` line framing each table section.
pub fn delimiter() -> String {
    format!("-- {} --", "*".repeat(83))
}

/// Lines written before a table's data.
pub fn opening_banner(table: &str) -> Vec<String> {
    vec![delimiter(), format!("-- TABLE: \"{table}\""), String::new()]
}

/// Lines written after a table's data.
pub fn closing_banner(row_count: u64, elapsed: Duration) -> Vec<String> {
    vec![
        String::new(),
        format!(
            "-- {} rows exported in {} sec(s)",
            row_count,
            format_seconds(elapsed)
        ),
        delimiter(),
        String::new(),
        String::new(),
    ]
}

/// Elapsed milliseconds divided by 1000, in shortest form (`0.042`, `2.5`, `0`).
pub fn format_seconds(elapsed: Duration) -> String {
    let seconds = elapsed.as_millis() as f64 / 1000.0;
    format!("{seconds}")
}

/// Appends lines to a sink.
pub struct SectionWriter<W> {
    inner: W,
    lines_written: u64,
}

impl SectionWriter<BufWriter<File>> {
    /// Opens `path` for appending, creating it if needed.
    pub async fn append_to(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: AsyncWrite + Unpin> SectionWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            lines_written: 0,
        }
    }

    /// Writes each line followed by a newline, in order.
    pub async fn write_banner(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.inner.write_all(line.as_bytes()).await?;
            self.inner.write_all(b"\n").await?;
            self.lines_written += 1;
        }
        Ok(())
    }

    /// Writes an already terminated statement line.
    pub async fn write_statement(&mut self, statement: &str) -> io::Result<()> {
        self.inner.write_all(statement.as_bytes()).await?;
        self.lines_written += 1;
        Ok(())
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Starts a fresh, empty dump at `path`, creating its directory if needed.
///
/// A previous dump is truncated. The file exists afterwards even when no
/// table ends up being written to it.
pub async fn prepare_output(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::File::create(path).await?;
    log::debug!("Prepared output file {}", path.display());
    Ok(())
}
