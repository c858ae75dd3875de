use crate::config::AppConfig;
use crate::error::{ConfigError, SinkError};
use crate::events_out::{start_events_out, EventsOutSink, EventsOutWriter};
use crate::runner::{EventSink, NoopSink, Runner};

/// Process-wide state shared by every run: configuration plus the optional
/// events-out writer.
pub struct AppContext {
    cfg: AppConfig,
    events_out: Option<EventsOutWriter>,
}

impl AppContext {
    pub async fn new(cfg: AppConfig) -> Result<Self, SinkError> {
        let events_out = start_events_out(&cfg.events_out).await?;
        Ok(Self { cfg, events_out })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn runner(&self) -> Result<Runner, ConfigError> {
        self.cfg.build_runner()
    }

    /// A sink for one run. Without events-out, events are discarded.
    pub fn sink(&self, run_id: &str, operation: &str) -> Box<dyn EventSink> {
        match &self.events_out {
            Some(writer) => Box::new(EventsOutSink::new(writer.tx(), run_id, operation)),
            None => Box::new(NoopSink),
        }
    }

    pub fn new_run_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Flushes events-out. Sinks handed out earlier must be dropped first.
    pub async fn shutdown(self) {
        if let Some(writer) = self.events_out {
            writer.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_event::Event;

    #[tokio::test]
    async fn sink_writes_through_events_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.jsonl");
        let mut cfg = AppConfig::default();
        cfg.events_out.enabled = true;
        cfg.events_out.path = path.display().to_string();

        let ctx = AppContext::new(cfg).await.unwrap();
        let run_id = AppContext::new_run_id();
        let sink = ctx.sink(&run_id, "op");
        sink.emit(Event::Start { attempt: 1 }.to_wire()).await.unwrap();
        drop(sink);
        ctx.shutdown().await;

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains(&run_id));
        assert_eq!(body.lines().count(), 1);
    }

    #[tokio::test]
    async fn disabled_events_out_uses_noop_sink() {
        let ctx = AppContext::new(AppConfig::default()).await.unwrap();
        let sink = ctx.sink("r", "op");
        sink.emit(Event::progress("x").to_wire()).await.unwrap();
        assert_eq!(ctx.runner().unwrap().max_validation_failures(), 2);
    }
}
