//! Route declarations.
//!
//! A [`Router`] is nothing but an ordered list of [`Route`]s. It does no
//! matching itself: [`Dispatcher::builder`](crate::Dispatcher::builder)
//! compiles it into a frozen [`RouteTable`](crate::RouteTable) once, at
//! startup, and every mistake (bad pattern, duplicate route, clashing
//! wildcard names) surfaces there as an [`Error`](crate::Error).

use std::fmt;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;

/// A method, a path pattern and the handler they lead to.
///
/// Pattern syntax, segments separated by `/`:
///
/// - `:name` binds the text up to the next `/` or `.`
/// - `*name` binds everything left, slashes included; last segment only
/// - anything else is literal
///
/// The method is uppercased; it may be any HTTP token, not only the
/// [`Method`] variants.
#[derive(Clone)]
pub struct Route {
    method: String,
    pattern: String,
    pub(crate) handler: BoxedHandler,
}

impl Route {
    pub fn new(method: impl AsRef<str>, pattern: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            pattern: pattern.into(),
            handler: handler.into_boxed_handler(),
        }
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn pattern(&self) -> &str { &self.pattern }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// The application's routes, in registration order.
///
/// Each registration returns `self` so calls chain:
///
/// ```rust
/// use trellis::{Method, Request, ResponseWriter, Router};
///
/// fn get_user(w: &mut ResponseWriter, r: &Request) -> Result<(), trellis::Error> {
///     w.write_json(&serde_json::json!({ "id": r.param("id") }))
/// }
/// fn delete_user(w: &mut ResponseWriter, _r: &Request) {
///     w.write_header(http::StatusCode::NO_CONTENT);
/// }
///
/// let router = Router::new()
///     .get("/users/:id", get_user)
///     .on(Method::Delete, "/users/:id", delete_user)
///     .route("PURGE", "/cache/*key", delete_user);
/// assert_eq!(router.len(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a handler for a method + pattern pair.
    pub fn on(self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.route(method, pattern, handler)
    }

    /// Like [`on`](Self::on), for any method name.
    pub fn route(mut self, method: impl AsRef<str>, pattern: &str, handler: impl Handler) -> Self {
        self.routes.push(Route::new(method, pattern, handler));
        self
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, pattern, handler)
    }

    pub fn patch(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, pattern, handler)
    }

    /// The routes registered so far, in order.
    pub fn routes(&self) -> &[Route] { &self.routes }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }

    pub(crate) fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, ResponseWriter};

    fn noop(_: &mut ResponseWriter, _: &Request) {}

    #[test]
    fn keeps_order_and_uppercases() {
        let router = Router::new()
            .get("/a", noop)
            .route("purge", "/b", noop)
            .delete("/c", noop);
        let routes = router.into_routes();
        let seen: Vec<_> = routes.iter().map(|r| (r.method(), r.pattern())).collect();
        assert_eq!(seen, [("GET", "/a"), ("PURGE", "/b"), ("DELETE", "/c")]);
    }

    #[test]
    fn closures_are_handlers() {
        let router = Router::new().post("/echo", |w: &mut ResponseWriter, r: &Request| {
            use std::io::Write;
            w.write_all(r.body())
        });
        assert_eq!(router.len(), 1);
    }
}
