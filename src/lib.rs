//! # trellis
//!
//! Trie-routed request dispatch for JSON REST services.
//!
//! ## The contract
//!
//! The host owns the network: sockets, TLS, header parsing, timeouts. trellis
//! owns what happens between "a complete request arrived" and "here are the
//! bytes to send back":
//!
//! - **Routing**: one prefix trie compiled at startup, `:param` and `*splat`
//!   placeholders, 404 vs 405 told apart
//! - **Fault containment**: a panicking handler costs one 500, never the
//!   process and never a neighbouring request
//! - **JSON responses**: compact or indented, gzip when the client accepts it
//! - **Telemetry**: one access line per response and an optional
//!   `GET /.status` route with request counts and response times
//!
//! No templating, no data binding, no middleware chain.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{Config, Dispatcher, Request, ResponseWriter, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trellis::Error> {
//!     let router = Router::new()
//!         .get("/users/:id", get_user)
//!         .get("/files/*path", get_file);
//!
//!     let config = Config { gzip: true, status_service: true, ..Config::default() };
//!     let dispatcher = Dispatcher::new(router, config)?;
//!
//!     Server::bind("0.0.0.0:8080")?.serve(dispatcher).await
//! }
//!
//! fn get_user(w: &mut ResponseWriter, r: &Request) -> Result<(), trellis::Error> {
//!     w.write_json(&serde_json::json!({ "id": r.param("id") }))
//! }
//!
//! fn get_file(w: &mut ResponseWriter, r: &Request) -> Result<(), trellis::Error> {
//!     w.write_json(&serde_json::json!({ "path": r.param("path") }))
//! }
//! ```

mod config;
mod dispatcher;
mod error;
mod fault;
mod handler;
mod logger;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod status;
mod trie;

pub use config::Config;
pub use dispatcher::{Dispatcher, DispatcherBuilder, Reloadable};
pub use error::{BoxError, Error};
pub use fault::Fault;
pub use handler::{Handler, Outcome};
pub use logger::{AccessRecord, Logger, TracingLogger};
pub use method::Method;
pub use request::Request;
pub use response::{ResponseWriter, error, not_found};
pub use router::{Route, Router};
pub use server::Server;
pub use status::{ResponseTimes, STATUS_PATH, StatusReport, StatusService};
pub use trie::{Lookup, Params, RouteTable};
