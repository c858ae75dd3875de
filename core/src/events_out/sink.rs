use async_trait::async_trait;
use serde_json::Value;

use crate::error::SinkError;
use crate::runner::EventSink;
use crate::tool_event::WrapperEvent;

use super::writer::EventsOutTx;

/// Tags each event with its run and operation and queues it as a JSONL line.
#[derive(Clone)]
pub struct EventsOutSink {
    tx: EventsOutTx,
    run_id: String,
    operation: String,
}

impl EventsOutSink {
    pub fn new(tx: EventsOutTx, run_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            tx,
            run_id: run_id.into(),
            operation: operation.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn wrap(&self, event: &Value) -> WrapperEvent {
        let mut wrapped = WrapperEvent::from_wire(event, chrono::Utc::now().to_rfc3339());
        wrapped.run_id = Some(self.run_id.clone());
        wrapped.operation = Some(self.operation.clone());
        wrapped
    }
}

#[async_trait]
impl EventSink for EventsOutSink {
    async fn emit(&self, event: Value) -> Result<(), SinkError> {
        let line = serde_json::to_string(&self.wrap(&event)).map_err(SinkError::Encode)?;
        self.tx.send_line(line).await;
        Ok(())
    }
}
