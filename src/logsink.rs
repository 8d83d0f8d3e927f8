//! Log Sink Module
//!
//! Asynchronous activity log: producers enqueue pre-formatted lines without
//! blocking, a single background task drains them to an append-only file.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{Result, ServerError};

// == Log Sink ==
/// Producer handle for the activity log.
///
/// Cloning is cheap; every clone feeds the same bounded queue. When the
/// queue is full the line is dropped and counted rather than blocking the
/// producer: logging must never stall request handling.
#[derive(Debug, Clone)]
pub struct LogSink {
    queue: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
}

impl LogSink {
    // == Open ==
    /// Opens the backing file in append mode and starts the writer task.
    ///
    /// An unopenable log file is a fatal initialization error for the
    /// whole server; the returned handle is awaited by [`LogSink::shutdown`].
    pub async fn open(
        path: impl AsRef<Path>,
        queue_capacity: usize,
    ) -> Result<(Self, JoinHandle<()>)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        let (sink, queue) = Self::with_queue(queue_capacity)?;
        let writer = tokio::spawn(drain_queue(queue, file));
        Ok((sink, writer))
    }

    /// Builds the producer handle and its queue without spawning a writer.
    fn with_queue(queue_capacity: usize) -> Result<(Self, mpsc::Receiver<String>)> {
        if queue_capacity == 0 {
            return Err(ServerError::InvalidCapacity {
                component: "log buffer",
            });
        }
        let (tx, rx) = mpsc::channel(queue_capacity);
        Ok((
            Self {
                queue: tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        ))
    }

    // == Log ==
    /// Timestamps a message and enqueues it, never blocking.
    ///
    /// Lines that do not fit in the queue are dropped and counted.
    pub fn log(&self, message: impl AsRef<str>) {
        let line = format!(
            "{} {}",
            Local::now().format("[%Y-%m-%d %H:%M:%S]"),
            message.as_ref()
        );
        if self.queue.try_send(line).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    // == Dropped Lines ==
    /// Returns how many lines were discarded because the queue was full.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // == Shutdown ==
    /// Closes this producer handle and waits for the writer to finish.
    ///
    /// The writer drains everything already enqueued before exiting, so
    /// nothing accepted before shutdown is lost. Clones still held by
    /// in-flight handler tasks keep the queue open until those tasks
    /// finish; their lines are drained too.
    pub async fn shutdown(self, writer: JoinHandle<()>) {
        drop(self.queue);
        if writer.await.is_err() {
            warn!("log writer task panicked during shutdown");
        }
    }
}

// == Writer Task ==
/// Drains the queue FIFO into the log file until every producer is gone.
///
/// Queue closure doubles as the shutdown signal, so the writer blocks on
/// `recv` without any polling timeout and still can never miss shutdown.
/// Mid-operation write failures are swallowed after a diagnostic: the log
/// is best-effort and must not take the server down.
async fn drain_queue(mut queue: mpsc::Receiver<String>, mut file: File) {
    while let Some(line) = queue.recv().await {
        if let Err(err) = write_line(&mut file, &line).await {
            warn!("dropping log line after write failure: {err}");
        }
    }
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tokio::fs;

    #[tokio::test]
    async fn test_lines_are_written_fifo_and_survive_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log");

        let (sink, writer) = LogSink::open(&path, 100).await.unwrap();
        for i in 0..10 {
            sink.log(format!("line-{i}"));
        }
        sink.shutdown(writer).await;

        let contents = fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 10);
        for (i, line) in lines.iter().enumerate() {
            assert!(
                line.ends_with(&format!("line-{i}")),
                "line {i} out of order: {line}"
            );
        }
    }

    #[tokio::test]
    async fn test_full_queue_drops_excess_and_keeps_fifo_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.log");

        // No writer yet, so the queue fills after two lines.
        let (sink, queue) = LogSink::with_queue(2).unwrap();
        for i in 0..5 {
            sink.log(format!("line-{i}"));
        }
        assert_eq!(sink.dropped_lines(), 3);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .unwrap();
        let writer = tokio::spawn(drain_queue(queue, file));
        drop(sink);
        writer.await.unwrap();

        let contents = fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2, "only the lines that fit are written");
        assert!(lines[0].ends_with("line-0"));
        assert!(lines[1].ends_with("line-1"));
    }

    #[tokio::test]
    async fn test_unopenable_file_is_fatal() {
        let result = LogSink::open("/definitely/not/a/dir/server.log", 10).await;
        assert!(matches!(result, Err(ServerError::Io(_))));
    }

    #[test]
    fn test_zero_queue_capacity_is_rejected() {
        let result = LogSink::with_queue(0);
        assert!(matches!(result, Err(ServerError::InvalidCapacity { .. })));
    }

    #[test]
    fn test_lines_carry_bracketed_timestamp_prefix() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("activity.log");

            let (sink, writer) = LogSink::open(&path, 10).await.unwrap();
            sink.log("stamped");
            sink.shutdown(writer).await;

            let contents = fs::read_to_string(&path).await.unwrap();
            let line = contents.lines().next().unwrap();

            // "[YYYY-MM-DD HH:MM:SS] stamped"
            let bytes = line.as_bytes();
            assert_eq!(bytes[0], b'[');
            assert_eq!(bytes[5], b'-');
            assert_eq!(bytes[8], b'-');
            assert_eq!(bytes[11], b' ');
            assert_eq!(bytes[14], b':');
            assert_eq!(bytes[17], b':');
            assert_eq!(bytes[20], b']');
            assert!(line.ends_with("] stamped"));
        });
    }
}
