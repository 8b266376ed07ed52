//! Request statistics, served as JSON at `GET /.status`.
//!
//! One [`StatusService`] lives as long as the process. The dispatcher records
//! every response into it; the status route reads a snapshot. Counters are
//! never reset.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use http::StatusCode;
use serde::Serialize;

use crate::error::Error;
use crate::response::ResponseWriter;

/// Path of the synthetic status route.
///
/// Registering `GET /.status` yourself is a [`StatusRouteConflict`]. A
/// wildcard route that would have matched it is shadowed, along with the
/// other `/.`-prefixed paths it served; the dispatcher logs a warning when
/// that happens.
///
/// [`StatusRouteConflict`]: crate::Error::StatusRouteConflict
pub const STATUS_PATH: &str = "/.status";

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    by_status: BTreeMap<u16, u64>,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

/// Concurrent response counter.
#[derive(Debug)]
pub struct StatusService {
    started: Instant,
    counters: Mutex<Counters>,
}

/// Point-in-time view of a [`StatusService`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub pid: u32,
    pub uptime_secs: f64,
    pub timestamp: u64,
    pub request_count: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub response_time: ResponseTimes,
}

/// Response times in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimes {
    pub total_micros: u64,
    pub mean_micros: u64,
    pub min_micros: u64,
    pub max_micros: u64,
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

impl StatusService {
    pub fn new() -> Self {
        Self { started: Instant::now(), counters: Mutex::default() }
    }

    /// Counts one response. Safe to call from any number of threads.
    pub fn record(&self, status: StatusCode, elapsed: Duration) {
        // counters stay consistent even if a holder panicked
        let mut c = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        c.requests += 1;
        *c.by_status.entry(status.as_u16()).or_default() += 1;
        c.total += elapsed;
        c.min = Some(c.min.map_or(elapsed, |min| min.min(elapsed)));
        c.max = c.max.max(elapsed);
    }

    /// A consistent copy of the counters.
    pub fn snapshot(&self) -> StatusReport {
        let (requests, by_status, total, min, max) = {
            let c = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
            (c.requests, c.by_status.clone(), c.total, c.min, c.max)
        };

        let mean = match u32::try_from(requests) {
            Ok(0) => Duration::ZERO,
            Ok(n) => total / n,
            Err(_) => Duration::from_secs_f64(total.as_secs_f64() / requests as f64),
        };

        StatusReport {
            pid: std::process::id(),
            uptime_secs: self.started.elapsed().as_secs_f64(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            request_count: requests,
            status_counts: by_status,
            response_time: ResponseTimes {
                total_micros: micros(total),
                mean_micros: micros(mean),
                min_micros: min.map_or(0, micros),
                max_micros: micros(max),
            },
        }
    }

    /// Status route handler body.
    pub(crate) fn serve(&self, w: &mut ResponseWriter) -> Result<(), Error> {
        w.write_json(&self.snapshot())
    }
}

impl Default for StatusService {
    fn default() -> Self { Self::new() }
}
