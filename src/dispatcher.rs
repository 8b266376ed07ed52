//! Request dispatch.
//!
//! [`Dispatcher::handle`] is the one entry point the host calls per request.
//! It always returns a response:
//!
//! ```text
//! start clock
//!   → route table lookup ── not found ──→ 404 {"error": ...}
//!                        ── wrong method → 405 {"error": ...} + Allow
//!                        ── found ──────→ handler inside the fault boundary
//!                                           panic / Err → 500
//!   → record status + log one access line
//! ```
//!
//! The route table is frozen when the dispatcher is built. To change routes,
//! build a new dispatcher and swap it into a [`Reloadable`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use tracing::{Level, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::fault::{self, Fault};
use crate::handler::ErasedHandler;
use crate::logger::{AccessRecord, Logger, TracingLogger};
use crate::method::Method;
use crate::request::Request;
use crate::response::{self, ResponseWriter};
use crate::router::{Route, Router};
use crate::status::{STATUS_PATH, StatusService};
use crate::trie::{Lookup, RouteTable};

/// Routes requests to handlers. Cheap to share: wrap it in an `Arc`.
pub struct Dispatcher {
    table: RouteTable,
    config: Config,
    logger: Arc<dyn Logger>,
    status: Option<Arc<StatusService>>,
}

/// Collects the collaborators a [`Dispatcher`] needs before it serves.
pub struct DispatcherBuilder {
    router: Router,
    config: Config,
    logger: Option<Arc<dyn Logger>>,
    status: Option<Arc<StatusService>>,
}

impl DispatcherBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default [`TracingLogger`].
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Uses `status` as the aggregator and turns the status route on.
    ///
    /// Pass the same instance to every rebuilt dispatcher to keep counting
    /// across route reloads.
    pub fn status_service(mut self, status: Arc<StatusService>) -> Self {
        self.status = Some(status);
        self
    }

    /// Compiles the routes. Nothing serves until this succeeds.
    pub fn build(self) -> Result<Dispatcher, Error> {
        let Self { router, config, logger, status } = self;

        let status = if config.status_service || status.is_some() {
            Some(status.unwrap_or_default())
        } else {
            None
        };

        let mut table = RouteTable::compile(router.into_routes())?;

        if let Some(service) = &status {
            match table.find(Method::Get.as_str(), STATUS_PATH) {
                Lookup::Found { route, .. } if route.pattern() == STATUS_PATH => {
                    return Err(Error::StatusRouteConflict { path: STATUS_PATH });
                }
                Lookup::NotFound => {}
                shadowed => warn!(
                    path = STATUS_PATH,
                    route = shadowed.route().map(Route::pattern),
                    "status route takes precedence over a wildcard user route for `/.` paths"
                ),
            }
            let service = Arc::clone(service);
            table.insert(Route::new(
                Method::Get,
                STATUS_PATH,
                move |w: &mut ResponseWriter, _: &Request| service.serve(w),
            ))?;
        }

        fault::install_hook();

        info!(
            routes = table.routes().len(),
            gzip = config.gzip,
            status_service = status.is_some(),
            "dispatcher ready"
        );

        Ok(Dispatcher {
            table,
            config,
            logger: logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            status,
        })
    }
}

impl Dispatcher {
    pub fn builder(router: Router) -> DispatcherBuilder {
        DispatcherBuilder { router, config: Config::default(), logger: None, status: None }
    }

    /// Compiles `router` with `config` and the default logger.
    pub fn new(router: Router, config: Config) -> Result<Self, Error> {
        Self::builder(router).config(config).build()
    }

    /// Routes one request and produces one response. Never panics on behalf
    /// of a handler.
    pub fn handle(&self, raw: http::Request<Bytes>) -> http::Response<Bytes> {
        let start = Instant::now();
        let method = raw.method().as_str().to_owned();
        let uri = raw
            .uri()
            .path_and_query()
            .map_or_else(|| raw.uri().path().to_owned(), |pq| pq.as_str().to_owned());

        let gzip = self.config.gzip && accepts_gzip(raw.headers());
        let mut writer = ResponseWriter::new(gzip, !self.config.disable_json_indent);

        let lookup = self.table.find(&method, raw.uri().path());
        let outcome = match lookup {
            Lookup::Found { route, params } => {
                let request = Request::new(raw, params);
                let handler = &route.handler;
                fault::contain(|| handler.call(&mut writer, &request))
            }
            Lookup::MethodNotAllowed { allowed } => {
                if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                    writer.set_header(header::ALLOW, value);
                }
                response::error(&mut writer, "Method not allowed", StatusCode::METHOD_NOT_ALLOWED)
                    .map_err(Fault::from)
            }
            Lookup::NotFound => response::not_found(&mut writer).map_err(Fault::from),
        };

        let response = match outcome.and_then(|()| writer.finish().map_err(Fault::from)) {
            Ok(response) => response,
            Err(fault) => self.internal_error(&fault),
        };

        self.observe(response.status(), start.elapsed(), method, uri);
        response
    }

    fn internal_error(&self, fault: &Fault) -> http::Response<Bytes> {
        let detail = fault.detail();
        self.logger.log(Level::ERROR, &detail);
        let body = if self.config.verbose_faults {
            detail
        } else {
            "Internal Server Error".to_owned()
        };
        response::plain(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    fn observe(&self, status: StatusCode, elapsed: Duration, method: String, uri: String) {
        if let Some(service) = &self.status {
            service.record(status, elapsed);
        }
        let record = AccessRecord {
            status_code: status.as_u16(),
            response_time: elapsed,
            http_method: method,
            request_uri: uri,
        };
        self.logger.log(Level::INFO, &record.render(self.config.json_logs));
    }

    pub fn config(&self) -> &Config { &self.config }
    pub fn route_table(&self) -> &RouteTable { &self.table }

    /// The aggregator, when the status route is on.
    pub fn status_service(&self) -> Option<&Arc<StatusService>> {
        self.status.as_ref()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .field("config", &self.config)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// `true` when `Accept-Encoding` names gzip with a non-zero quality.
fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|item| {
            let mut parts = item.split(';');
            let coding = parts.next().unwrap_or_default().trim();
            let refused = parts.any(|param| {
                param
                    .trim()
                    .strip_prefix("q=")
                    .and_then(|q| q.trim().parse::<f32>().ok())
                    .is_some_and(|q| q <= 0.0)
            });
            (coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip")) && !refused
        })
}

// ── Hot swap ──────────────────────────────────────────────────────────────────

/// A dispatcher that can be replaced while serving.
///
/// Each request runs entirely on the dispatcher that was current when it
/// started; [`swap`](Self::swap) only affects requests that arrive later.
pub struct Reloadable {
    current: ArcSwap<Dispatcher>,
}

impl Reloadable {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { current: ArcSwap::from_pointee(dispatcher) }
    }

    pub fn handle(&self, raw: http::Request<Bytes>) -> http::Response<Bytes> {
        self.current.load_full().handle(raw)
    }

    /// Installs `next` and returns the dispatcher it replaced.
    pub fn swap(&self, next: Dispatcher) -> Arc<Dispatcher> {
        info!(routes = next.table.routes().len(), "swapping route table");
        self.current.swap(Arc::new(next))
    }

    pub fn current(&self) -> Arc<Dispatcher> {
        self.current.load_full()
    }
}

impl From<Dispatcher> for Reloadable {
    fn from(dispatcher: Dispatcher) -> Self {
        Self::new(dispatcher)
    }
}

impl fmt::Debug for Reloadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reloadable").field("current", &*self.current.load()).finish()
    }
}
