//! Result sinks
//!
//! Matched URLs are streamed to a [`ResultSink`] the moment they are found.
//! Implementations must accept concurrent calls and write whole lines.

use crate::error::{SiftError, SiftResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default buffer size for the output file (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Append-only destination for matched URLs
pub trait ResultSink: Send + Sync {
    /// Append one line. Called from many worker threads at once.
    fn record(&self, url: &str) -> anyhow::Result<()>;

    /// Push buffered lines to the destination
    fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct FileSinkInner {
    writer: BufWriter<File>,
    lines_written: u64,
}

/// Thread-safe append-mode file sink
pub struct FileSink {
    inner: Mutex<FileSinkInner>,
    path: PathBuf,
}

impl FileSink {
    /// Open `path` for appending, creating it and its parent directory if needed
    pub fn open(path: &Path) -> SiftResult<Self> {
        Self::with_capacity(path, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(path: &Path, buffer_size: usize) -> SiftResult<Self> {
        let unavailable = |source| SiftError::SinkUnavailable {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            ensure_output_dir(parent).map_err(|source| SiftError::SinkUnavailable {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(unavailable)?;

        Ok(Self {
            inner: Mutex::new(FileSinkInner {
                writer: BufWriter::with_capacity(buffer_size, file),
                lines_written: 0,
            }),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines recorded through this handle
    pub fn lines_written(&self) -> u64 {
        self.inner.lock().map(|w| w.lines_written).unwrap_or_default()
    }
}

impl ResultSink for FileSink {
    fn record(&self, url: &str) -> anyhow::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Output writer for {:?} is poisoned", self.path))?;

        // One write per line keeps lines whole in the buffer
        let mut line = String::with_capacity(url.len() + 1);
        line.push_str(url);
        line.push('\n');
        inner.writer.write_all(line.as_bytes())?;

        inner.lines_written += 1;
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Output writer for {:?} is poisoned", self.path))?;
        inner.writer.flush()?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.get_mut() {
            let _ = inner.writer.flush();
        }
    }
}

/// In-memory sink, for embedding the engine or inspecting results
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn into_lines(self) -> Vec<String> {
        self.lines.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn record(&self, url: &str) -> anyhow::Result<()> {
        self.lines
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory sink is poisoned"))?
            .push(url.to_string());
        Ok(())
    }
}

/// Ensure output directory exists
pub fn ensure_output_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
