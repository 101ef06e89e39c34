//! Append-only recording sink
//!
//! Tees one ingest session's byte stream to a file. The sink owns a writer
//! task fed through a bounded queue, so file I/O latency never reaches the
//! broadcast path: `append` is a non-blocking queue push, and a queue that
//! fills (or a write that fails) fails the sink for the rest of the session
//! while the relay itself carries on.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Append-only file tee for one ingest session
///
/// Bytes appended are exactly the bytes the fan-out engine was given, in
/// receipt order. Never shared across sessions; consuming `self` in
/// [`close`](RecordingSink::close) makes double-close unrepresentable.
pub struct RecordingSink {
    path: PathBuf,
    tx: Option<mpsc::Sender<Bytes>>,
    failed: Arc<AtomicBool>,
    bytes_written: Arc<AtomicU64>,
    writer: JoinHandle<std::io::Result<()>>,
}

impl RecordingSink {
    /// Create `dir/<session_id>.<ext>` and start the writer task
    ///
    /// The directory is created if missing. Creation failure is an I/O
    /// error for the caller to log; the session then runs unrecorded.
    pub async fn open(dir: &Path, session_id: u64, ext: &str, queue: usize) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.{}", session_id, ext));
        let file = tokio::fs::File::create(&path).await?;

        let (tx, mut rx) = mpsc::channel::<Bytes>(queue.max(1));
        let failed = Arc::new(AtomicBool::new(false));
        let bytes_written = Arc::new(AtomicU64::new(0));

        let task_failed = Arc::clone(&failed);
        let task_bytes = Arc::clone(&bytes_written);
        let task_path = path.clone();
        let writer = tokio::spawn(async move {
            let mut out = BufWriter::new(file);
            while let Some(chunk) = rx.recv().await {
                if let Err(e) = out.write_all(&chunk).await {
                    task_failed.store(true, Ordering::Relaxed);
                    tracing::error!(path = %task_path.display(), error = %e, "Recording write failed");
                    return Err(e);
                }
                let _ = task_bytes.fetch_add(chunk.len() as u64, Ordering::Relaxed);
            }
            out.flush().await
        });

        tracing::info!(path = %path.display(), "Recording started");

        Ok(Self {
            path,
            tx: Some(tx),
            failed,
            bytes_written,
            writer,
        })
    }

    /// Queue a chunk for appending, without blocking
    ///
    /// Fails once the sink has failed, the writer is gone, or the queue is
    /// full; any of these marks the sink failed so the caller stops
    /// tee-ing for the rest of the session.
    pub fn append(&self, chunk: Bytes) -> Result<()> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(Error::SinkClosed);
        }
        let tx = self.tx.as_ref().ok_or(Error::SinkClosed)?;
        tx.try_send(chunk).map_err(|_| {
            self.failed.store(true, Ordering::Relaxed);
            Error::SinkClosed
        })
    }

    /// Flush, release the file, and return the total bytes written
    pub async fn close(mut self) -> Result<u64> {
        // Dropping the sender ends the writer loop after it drains the queue
        self.tx.take();
        match self.writer.await {
            Ok(Ok(())) => Ok(self.bytes_written.load(Ordering::Relaxed)),
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(e) => Err(Error::Io(std::io::Error::other(e))),
        }
    }

    /// Path of the recording file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes flushed to the writer task so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Whether the sink has failed and stopped accepting appends
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}
