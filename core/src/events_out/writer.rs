use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::EventsOutConfig;
use crate::error::SinkError;

pub const STDOUT_PATH: &str = "stdout:";

fn audit_preview(s: &str) -> String {
    const MAX: usize = 120;
    if s.len() <= MAX {
        return s.to_string();
    }
    let end = s
        .char_indices()
        .take_while(|(i, _)| *i < MAX)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let mut out = s[..end].to_string();
    out.push('…');
    out
}

#[derive(Clone)]
pub struct EventsOutTx {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl EventsOutTx {
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queues one JSONL line. Never fails: a full channel either waits or
    /// drops (per config) and a dead writer only logs.
    pub async fn send_line(&self, line: String) {
        if self.drop_when_full {
            if self.tx.try_send(line).is_err() {
                let count = self.dropped.fetch_add(1, Ordering::Relaxed);
                if count.is_multiple_of(100) {
                    tracing::warn!(
                        target: "toolrun.events_out",
                        dropped_total = count + 1,
                        "events_out channel full, lines are being dropped"
                    );
                }
            }
        } else if self.tx.send(line).await.is_err() {
            tracing::debug!(target: "toolrun.events_out", "events_out writer closed, send failed");
        }
    }
}

/// A running writer task plus the sending half used to feed it.
pub struct EventsOutWriter {
    tx: EventsOutTx,
    task: JoinHandle<()>,
}

impl EventsOutWriter {
    pub fn tx(&self) -> EventsOutTx {
        self.tx.clone()
    }

    /// Drops this handle's sender and waits for the task to flush.
    /// Lines queued through clones still alive are written once those drop.
    pub async fn close(self) {
        let dropped = self.tx.dropped_count();
        drop(self.tx);
        if self.task.await.is_err() {
            tracing::error!(target: "toolrun.events_out", "events_out writer task panicked");
        }
        if dropped > 0 {
            tracing::warn!(target: "toolrun.events_out", dropped, "events_out closed with dropped lines");
        }
    }
}

/// Opens the destination and spawns the writer. `Ok(None)` when disabled.
pub async fn start_events_out(cfg: &EventsOutConfig) -> Result<Option<EventsOutWriter>, SinkError> {
    if !cfg.enabled {
        tracing::debug!(target: "toolrun.events_out", "events_out disabled");
        return Ok(None);
    }
    if cfg.path.trim().is_empty() {
        tracing::warn!(
            target: "toolrun.events_out",
            "events_out path is empty in config, no events will be written"
        );
        return Ok(None);
    }

    let to_stdout = cfg.path == STDOUT_PATH;
    let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = if to_stdout {
        Box::new(tokio::io::stdout())
    } else {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.path)
            .await
            .map_err(SinkError::Write)?;
        Box::new(file)
    };

    tracing::info!(
        target: "toolrun.events_out",
        path = %cfg.path,
        channel_capacity = cfg.channel_capacity,
        drop_when_full = cfg.drop_when_full,
        "events_out writer started"
    );

    let (tx, mut rx) = mpsc::channel::<String>(cfg.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));

    let task = tokio::spawn(async move {
        let mut write_count = 0usize;
        while let Some(mut line) = rx.recv().await {
            if !line.ends_with('\n') {
                line.push('\n');
            }
            if write_count < 5 {
                tracing::debug!(
                    target: "toolrun.events_out",
                    count = write_count,
                    bytes = line.len(),
                    preview = %audit_preview(line.trim_end()),
                    "writing events_out line"
                );
            }
            if writer.write_all(line.as_bytes()).await.is_err() {
                tracing::error!(
                    target: "toolrun.events_out",
                    "failed to write events_out line, writer task exiting"
                );
                return;
            }
            write_count += 1;
            if (write_count.is_multiple_of(10) || to_stdout) && writer.flush().await.is_err() {
                tracing::error!(target: "toolrun.events_out", "failed to flush events_out");
                return;
            }
        }
        let _ = writer.flush().await;
    });

    Ok(Some(EventsOutWriter {
        tx: EventsOutTx {
            tx,
            dropped,
            drop_when_full: cfg.drop_when_full,
        },
        task,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_cfg(path: &std::path::Path) -> EventsOutConfig {
        EventsOutConfig {
            enabled: true,
            path: path.display().to_string(),
            ..EventsOutConfig::default()
        }
    }

    #[tokio::test]
    async fn disabled_config_starts_nothing() {
        let writer = start_events_out(&EventsOutConfig::default()).await.unwrap();
        assert!(writer.is_none());
    }

    #[tokio::test]
    async fn lines_are_appended_newline_terminated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let writer = start_events_out(&file_cfg(&path)).await.unwrap().unwrap();
        let tx = writer.tx();
        tx.send_line("{\"a\":1}".to_string()).await;
        tx.send_line("{\"a\":2}\n".to_string()).await;
        drop(tx);
        writer.close().await;

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body, "{\"a\":1}\n{\"a\":2}\n");
    }

    #[tokio::test]
    async fn unopenable_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("events.jsonl");
        let err = start_events_out(&file_cfg(&path)).await.err();
        assert!(matches!(err, Some(SinkError::Write(_))));
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(100);
        let p = audit_preview(&long);
        assert!(p.ends_with('…'));
        assert!(p.len() <= 125);
        assert_eq!(audit_preview("short"), "short");
    }
}
