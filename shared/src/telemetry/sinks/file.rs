//! File-append sink writing one JSON document per line.
//!
//! `accept` serializes and enqueues; a background task owns the file and
//! does the writing, so a slow disk never blocks the caller.

use super::{LogSink, SinkError};
use crate::models::LogRecord;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

/// Default number of lines waiting to be written.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

enum Command {
    Line(Vec<u8>),
    Flush(oneshot::Sender<()>),
}

/// Appends records to a file as JSON lines.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    tx: mpsc::Sender<Command>,
    failures: Arc<AtomicU64>,
}

impl FileSink {
    /// Opens (or creates) `path` for appending, creating parent directories,
    /// and starts the writer task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Self::open_with_capacity(path, DEFAULT_QUEUE_CAPACITY)
    }

    /// Like [`FileSink::open`] with an explicit queue capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn open_with_capacity(
        path: impl AsRef<Path>,
        queue_capacity: usize,
    ) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let failures = Arc::new(AtomicU64::new(0));
        tokio::spawn(write_lines(
            tokio::fs::File::from_std(file),
            rx,
            Arc::clone(&failures),
        ));

        Ok(Self { path, tx, failures })
    }

    /// Returns the path being written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of lines that failed to be written.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Waits until every line accepted so far has been written and flushed.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] if the writer task has stopped.
    pub async fn flush(&self) -> Result<(), SinkError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .await
            .map_err(|_| SinkError::Closed)?;
        done.await.map_err(|_| SinkError::Closed)
    }
}

impl LogSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn accept(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.tx.try_send(Command::Line(line)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

async fn write_lines(
    mut file: tokio::fs::File,
    mut rx: mpsc::Receiver<Command>,
    failures: Arc<AtomicU64>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Line(line) => {
                if let Err(e) = file.write_all(&line).await {
                    failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "Failed to write log line");
                }
            }
            Command::Flush(ack) => {
                if let Err(e) = file.flush().await {
                    tracing::warn!(error = %e, "Failed to flush log file");
                }
                let _ = ack.send(());
            }
        }
    }

    if let Err(e) = file.flush().await {
        tracing::warn!(error = %e, "Failed to flush log file on close");
    }
}
