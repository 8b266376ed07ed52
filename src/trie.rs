//! Prefix trie over path pieces.
//!
//! Built once from the ordered route list, then frozen. Lookup walks one piece
//! at a time and never backtracks:
//!
//! 1. a literal child equal to the piece,
//! 2. else the param child, binding the piece (never a separator); when the
//!    path goes on with a final `.ext` that no pattern spells out, the
//!    extension is dropped and the walk ends on the param,
//! 3. else the splat child, binding everything left and stopping there,
//! 4. else the path is unknown.
//!
//! Registration order only matters while compiling, where it decides which of
//! two clashing routes is reported as the conflict.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use tracing::debug;

use crate::error::Error;
use crate::method;
use crate::pattern::{self, Segment};
use crate::router::Route;

/// Path parameters bound during a lookup, keyed by placeholder name.
pub type Params = HashMap<String, String>;

#[derive(Debug, Default)]
struct Node {
    literals: HashMap<String, Node>,
    param: Option<Wildcard>,
    splat: Option<Wildcard>,
    /// Normalized method → index into `RouteTable::routes`.
    routes: HashMap<String, usize>,
}

#[derive(Debug)]
struct Wildcard {
    name: String,
    node: Box<Node>,
}

impl Wildcard {
    fn new(name: &str) -> Self {
        Self { name: name.to_owned(), node: Box::default() }
    }
}

impl Node {
    fn insert(&mut self, segments: &[Segment], route: &Route, index: usize) -> Result<(), Error> {
        let conflict = |reason: String| Error::RouteConflict {
            method: route.method().to_owned(),
            pattern: route.pattern().to_owned(),
            reason,
        };

        let mut node = self;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literals.entry(text.clone()).or_default(),
                Segment::Param(name) => {
                    let slot = node.param.get_or_insert_with(|| Wildcard::new(name));
                    if slot.name != *name {
                        return Err(conflict(format!(
                            "`:{name}` clashes with `:{}` at the same position",
                            slot.name
                        )));
                    }
                    &mut *slot.node
                }
                Segment::Splat(name) => {
                    let slot = node.splat.get_or_insert_with(|| Wildcard::new(name));
                    if slot.name != *name {
                        return Err(conflict(format!(
                            "`*{name}` clashes with `*{}` at the same position",
                            slot.name
                        )));
                    }
                    &mut *slot.node
                }
            };
        }

        match node.routes.entry(route.method().to_owned()) {
            Entry::Occupied(_) => Err(conflict("already registered".to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(index);
                Ok(())
            }
        }
    }
}

/// The outcome of [`RouteTable::find`].
#[derive(Debug)]
pub enum Lookup<'a> {
    /// A route is registered for this path and method.
    Found { route: &'a Route, params: Params },
    /// The path exists, but not for the requested method.
    MethodNotAllowed { allowed: Vec<&'a str> },
    /// No pattern matches the path.
    NotFound,
}

impl<'a> Lookup<'a> {
    /// `false` only for [`Lookup::NotFound`].
    pub fn path_matched(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    pub fn route(&self) -> Option<&'a Route> {
        match self {
            Self::Found { route, .. } => Some(*route),
            _ => None,
        }
    }
}

/// A compiled, read-only route table.
///
/// Shared across every concurrent request without locking. To change routes,
/// compile a new table and swap the whole dispatcher
/// (see [`Reloadable`](crate::Reloadable)).
pub struct RouteTable {
    root: Node,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compiles `routes` into a trie.
    ///
    /// Fails on the first invalid pattern or method, on two routes with the
    /// same method and path, and on differently named wildcards sharing a
    /// trie position. No partial table is ever returned.
    pub fn compile(routes: Vec<Route>) -> Result<Self, Error> {
        let mut table = Self { root: Node::default(), routes: Vec::with_capacity(routes.len()) };
        for route in routes {
            table.insert(route)?;
        }
        debug!(routes = table.routes.len(), "route table compiled");
        Ok(table)
    }

    /// Adds one route behind the ones already compiled.
    pub(crate) fn insert(&mut self, route: Route) -> Result<(), Error> {
        method::normalize(route.method())?;
        let segments = pattern::parse(route.pattern())?;
        self.root.insert(&segments, &route, self.routes.len())?;
        self.routes.push(route);
        Ok(())
    }

    /// Finds the route for `method` (any case) and `path`.
    pub fn find(&self, method: &str, path: &str) -> Lookup<'_> {
        let mut node = &self.root;
        let mut rest = path;
        let mut params = Params::new();

        while !rest.is_empty() {
            let piece = pattern::next_piece(rest);

            if let Some(child) = node.literals.get(piece) {
                node = child;
                rest = &rest[piece.len()..];
                continue;
            }

            if let Some(param) = node.param.as_ref().filter(|_| !pattern::is_separator(piece)) {
                params.insert(param.name.clone(), piece.to_owned());
                node = &*param.node;
                rest = &rest[piece.len()..];
                if is_trailing_extension(rest) && !node.literals.contains_key(".") {
                    break;
                }
                continue;
            }

            if let Some(splat) = &node.splat {
                params.insert(splat.name.clone(), rest.to_owned());
                node = &*splat.node;
                break;
            }

            return Lookup::NotFound;
        }

        if node.routes.is_empty() {
            return Lookup::NotFound;
        }

        match node.routes.get(&method.to_ascii_uppercase()) {
            Some(&index) => Lookup::Found { route: &self.routes[index], params },
            None => {
                let mut allowed: Vec<&str> = node.routes.keys().map(String::as_str).collect();
                allowed.sort_unstable();
                Lookup::MethodNotAllowed { allowed }
            }
        }
    }

    /// The routes in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// `.json`, `.tar.gz`: a dot-led remainder with no further `/`.
fn is_trailing_extension(rest: &str) -> bool {
    rest.starts_with('.') && !rest.contains('/')
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable").field("routes", &self.routes).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, ResponseWriter};

    fn noop(_: &mut ResponseWriter, _: &Request) {}

    fn table(routes: &[(&str, &str)]) -> Result<RouteTable, Error> {
        RouteTable::compile(routes.iter().map(|(m, p)| Route::new(*m, *p, noop)).collect())
    }

    fn found<'a, 'b>(lookup: &'b Lookup<'a>) -> (&'a str, &'b Params) {
        match lookup {
            Lookup::Found { route, params } => (route.pattern(), params),
            other => panic!("expected a route, got {other:?}"),
        }
    }

    #[test]
    fn param_binds_segment() {
        let t = table(&[("GET", "/users/:id")]).unwrap();
        let lookup = t.find("GET", "/users/42");
        let (pattern, params) = found(&lookup);
        assert_eq!(pattern, "/users/:id");
        assert_eq!(params["id"], "42");
    }

    #[test]
    fn param_stops_at_dot() {
        let t = table(&[("GET", "/users/:id.json")]).unwrap();
        let lookup = t.find("GET", "/users/42.json");
        assert_eq!(found(&lookup).1["id"], "42");

        let t = table(&[("GET", "/users/:id")]).unwrap();
        let lookup = t.find("GET", "/users/42.json");
        let (pattern, params) = found(&lookup);
        assert_eq!(pattern, "/users/:id");
        assert_eq!(params["id"], "42");
        assert_eq!(found(&t.find("GET", "/users/report.tar.gz")).1["id"], "report");

        // the extension is only dropped at the end of the path
        assert!(matches!(t.find("GET", "/users/42.json/x"), Lookup::NotFound));
    }

    #[test]
    fn spelled_out_extension_wins() {
        let t = table(&[("GET", "/users/:id"), ("PUT", "/users/:id.json")]).unwrap();
        assert_eq!(found(&t.find("PUT", "/users/42.json")).0, "/users/:id.json");
        // `.xml` walks into the `.json` branch and dead-ends
        assert!(matches!(t.find("GET", "/users/42.xml"), Lookup::NotFound));
        match t.find("GET", "/users/42.json") {
            Lookup::MethodNotAllowed { allowed } => assert_eq!(allowed, ["PUT"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn splat_takes_the_rest() {
        let t = table(&[("GET", "/files/*path")]).unwrap();
        let lookup = t.find("GET", "/files/a/b/c");
        assert_eq!(found(&lookup).1["path"], "a/b/c");

        let lookup = t.find("GET", "/files/report.tar.gz");
        assert_eq!(found(&lookup).1["path"], "report.tar.gz");
    }

    #[test]
    fn literal_beats_param() {
        let t = table(&[("GET", "/users/:id"), ("GET", "/users/me")]).unwrap();
        let lookup = t.find("GET", "/users/me");
        let (pattern, params) = found(&lookup);
        assert_eq!(pattern, "/users/me");
        assert!(params.is_empty());
    }

    #[test]
    fn param_beats_splat() {
        let t = table(&[("GET", "/a/*rest"), ("GET", "/a/:one")]).unwrap();
        assert_eq!(found(&t.find("GET", "/a/x")).0, "/a/:one");
        assert_eq!(found(&t.find("GET", "/a/.hidden")).0, "/a/*rest");
        // no backtracking: once the param took `x`, the splat is out of reach
        assert!(matches!(t.find("GET", "/a/x/y"), Lookup::NotFound));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let t = table(&[("GET", "/users/:id")]).unwrap();
        let lookup = t.find("GET", "/posts/1");
        assert!(!lookup.path_matched());
        assert!(lookup.route().is_none());
        assert!(matches!(t.find("GET", "/users"), Lookup::NotFound));
        assert!(matches!(t.find("GET", "/users/"), Lookup::NotFound));
    }

    #[test]
    fn wrong_method_is_path_matched() {
        let t = table(&[("GET", "/users/:id"), ("delete", "/users/:id")]).unwrap();
        let lookup = t.find("POST", "/users/1");
        assert!(lookup.path_matched());
        assert!(lookup.route().is_none());
        match lookup {
            Lookup::MethodNotAllowed { allowed } => assert_eq!(allowed, ["DELETE", "GET"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn method_lookup_ignores_case() {
        let t = table(&[("get", "/")]).unwrap();
        assert!(t.find("Get", "/").route().is_some());
    }

    #[test]
    fn duplicate_route_is_a_conflict() {
        let err = table(&[("GET", "/users/:id"), ("get", "/users/:id")]).unwrap_err();
        assert!(matches!(err, Error::RouteConflict { .. }));
    }

    #[test]
    fn wildcard_names_must_agree() {
        let err = table(&[("GET", "/users/:id"), ("POST", "/users/:name")]).unwrap_err();
        assert!(matches!(err, Error::RouteConflict { .. }));

        let err = table(&[("GET", "/f/*path"), ("PUT", "/f/*file")]).unwrap_err();
        assert!(matches!(err, Error::RouteConflict { .. }));

        assert!(table(&[("GET", "/users/:id"), ("PUT", "/users/:id/posts")]).is_ok());
    }

    #[test]
    fn invalid_method_fails_compilation() {
        assert!(matches!(table(&[("G ET", "/")]), Err(Error::InvalidMethod(_))));
    }
}
