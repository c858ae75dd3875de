use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::SinkError;

/// Receives every event of every attempt, in order, as its wire-shaped map.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Value) -> Result<(), SinkError>;
}

/// Forwards events into an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Value>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Value>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: Value) -> Result<(), SinkError> {
        self.tx.send(event).map_err(|_| SinkError::Closed)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn emit(&self, _event: Value) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.emit(json!({"n": 1})).await.unwrap();
        sink.emit(json!({"n": 2})).await.unwrap();
        assert_eq!(rx.recv().await, Some(json!({"n": 1})));
        assert_eq!(rx.recv().await, Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        assert!(matches!(
            sink.emit(json!({})).await,
            Err(SinkError::Closed)
        ));
    }

    #[test]
    fn noop_sink_accepts_everything() {
        tokio_test::assert_ok!(tokio_test::block_on(NoopSink.emit(json!({"type": "tool.end"}))));
    }
}
