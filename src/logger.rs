//! Response logging.
//!
//! Every request ends in exactly one [`AccessRecord`], whatever happened:
//! handler success, 404, 405 or a contained fault. The record is rendered as
//! a text line or a JSON object and handed to a [`Logger`].

use std::time::Duration;

use serde::Serialize;
use tracing::Level;

/// Where log lines go.
///
/// Called concurrently from every in-flight request; implementations must
/// write each line atomically. The default, [`TracingLogger`], forwards to
/// `tracing`, whose subscribers already do.
pub trait Logger: Send + Sync + 'static {
    fn log(&self, level: Level, line: &str);
}

/// Forwards lines to `tracing` on the `trellis::access` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, line: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "trellis::access", "{line}"),
            Level::WARN  => tracing::warn!(target: "trellis::access", "{line}"),
            Level::INFO  => tracing::info!(target: "trellis::access", "{line}"),
            Level::DEBUG => tracing::debug!(target: "trellis::access", "{line}"),
            _            => tracing::trace!(target: "trellis::access", "{line}"),
        }
    }
}

/// One line per response.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    pub status_code: u16,
    #[serde(rename = "responseTimeMicros", serialize_with = "as_micros")]
    pub response_time: Duration,
    pub http_method: String,
    pub request_uri: String,
}

fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

impl AccessRecord {
    /// `200 1.2ms GET /users/42`, or the JSON form when `json` is set.
    pub fn render(&self, json: bool) -> String {
        if json {
            if let Ok(line) = serde_json::to_string(self) {
                return line;
            }
        }
        format!(
            "{} {:?} {} {}",
            self.status_code, self.response_time, self.http_method, self.request_uri
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every line in memory.
    #[derive(Default)]
    pub(crate) struct MemoryLogger {
        pub(crate) lines: Mutex<Vec<(Level, String)>>,
    }

    impl Logger for MemoryLogger {
        fn log(&self, level: Level, line: &str) {
            self.lines.lock().unwrap().push((level, line.to_owned()));
        }
    }

    fn record() -> AccessRecord {
        AccessRecord {
            status_code: 404,
            response_time: Duration::from_micros(1500),
            http_method: "GET".into(),
            request_uri: "/nope?x=1".into(),
        }
    }

    #[test]
    fn text_line() {
        assert_eq!(record().render(false), "404 1.5ms GET /nope?x=1");
    }

    #[test]
    fn json_line() {
        let value: serde_json::Value = serde_json::from_str(&record().render(true)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "statusCode": 404,
                "responseTimeMicros": 1500,
                "httpMethod": "GET",
                "requestUri": "/nope?x=1",
            })
        );
    }

    #[test]
    fn memory_logger_keeps_lines() {
        let logger = MemoryLogger::default();
        logger.log(Level::INFO, "a");
        logger.log(Level::ERROR, "b");
        assert_eq!(logger.lines.lock().unwrap().len(), 2);
    }
}
