//! Integration tests for the logging system
//!
//! `init_logging` installs a process-global subscriber, so this binary
//! initializes exactly once and checks everything against that subscriber.

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_url_query, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Info
    }
}

#[test]
fn test_global_logging_forwards_to_sink_once() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).expect("first initialization succeeds");

    let url = "https://api.quran.com/api/v4/search?q=patience";
    tracing::warn!(target: "core_intercept", url = %redact_url_query(url), "revalidation failed");
    tracing::debug!(target: "core_intercept", "cache hit");
    tracing::info!(target: "some_dependency", "filtered out below warn");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(
            entries[0].fields.get("url"),
            Some(&"https://api.quran.com/api/v4/search".to_string())
        );
    }

    let second = init_logging(config);
    assert!(second.is_err());
    assert!(second.unwrap_err().to_string().contains("initialize logging"));
}
