use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

/// Logs page lifecycle events for observability/debugging.
pub struct LifecycleLoggerPlugin {
    logger: Logger,
    level: LogLevel,
    log_scroll: bool,
    log_timers: bool,
    log_clicks: bool,
}

impl LifecycleLoggerPlugin {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_scroll: false,
            log_timers: false,
            log_clicks: true,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_scroll(mut self, enabled: bool) -> Self {
        self.log_scroll = enabled;
        self
    }

    pub fn log_timers(mut self, enabled: bool) -> Self {
        self.log_timers = enabled;
        self
    }

    pub fn log_clicks(mut self, enabled: bool) -> Self {
        self.log_clicks = enabled;
        self
    }

    fn emit(
        &self,
        ctx: &RuntimeContext<'_>,
        message: &str,
        fields: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) {
        let page_time = json_kv("page_time_ms", json!(ctx.now().as_millis() as u64));
        let event = event_with_fields(
            self.level,
            "curtain::runtime.lifecycle",
            message,
            std::iter::once(page_time).chain(fields),
        );
        let _ = self.logger.log_event(event);
    }
}

impl PagePlugin for LifecycleLoggerPlugin {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.emit(
            ctx,
            "plugin_initialized",
            [
                json_kv("logger_level", json!(format!("{:?}", self.level))),
                json_kv("elements", json!(ctx.document().ids().len())),
            ],
        );
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Ready => self.emit(ctx, "event.ready", std::iter::empty()),
            RuntimeEvent::Revealed => self.emit(ctx, "event.revealed", std::iter::empty()),
            RuntimeEvent::Media { element, signal } => self.emit(
                ctx,
                "event.media",
                [
                    json_kv("element", json!(element)),
                    json_kv("signal", json!(signal.as_str())),
                ],
            ),
            RuntimeEvent::Submit(form) => {
                self.emit(ctx, "event.submit", [json_kv("form", json!(form))])
            }
            RuntimeEvent::Click(id) if self.log_clicks => {
                self.emit(ctx, "event.click", [json_kv("element", json!(id))])
            }
            RuntimeEvent::Scroll { y } if self.log_scroll => {
                self.emit(ctx, "event.scroll", [json_kv("y", json!(y))])
            }
            RuntimeEvent::Timer(fired) if self.log_timers => self.emit(
                ctx,
                "event.timer",
                [
                    json_kv("label", json!(fired.label)),
                    json_kv("repeating", json!(fired.repeating)),
                ],
            ),
            _ => {}
        }

        Ok(EventFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::logging::MemorySink;
    use crate::runtime::PageRuntime;

    #[test]
    fn logs_lifecycle_and_skips_scroll_by_default() {
        let sink = MemorySink::new();
        let mut runtime = PageRuntime::new(Document::new());
        runtime.register_plugin_with_priority(
            LifecycleLoggerPlugin::new(Logger::new(sink.clone())),
            -100,
        );
        runtime.start().unwrap();
        runtime.dispatch(RuntimeEvent::Scroll { y: 10.0 }).unwrap();
        runtime.dispatch(RuntimeEvent::Revealed).unwrap();

        assert_eq!(sink.messages("plugin_initialized").len(), 1);
        assert_eq!(sink.messages("event.ready").len(), 1);
        assert!(sink.messages("event.scroll").is_empty());
        let revealed = sink.messages("event.revealed");
        assert_eq!(revealed[0].field("page_time_ms"), Some(&json!(0)));
    }
}
