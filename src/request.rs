//! Request envelope handed to handlers.

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::trie::Params;

/// The raw request plus the path parameters bound by the route table.
///
/// Parameters are filled in once, before the handler runs, and never change.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Bytes>,
    params: Params,
}

impl Request {
    pub(crate) fn new(inner: http::Request<Bytes>, params: Params) -> Self {
        Self { inner, params }
    }

    pub fn method(&self) -> &Method { self.inner.method() }
    pub fn uri(&self) -> &Uri { self.inner.uri() }
    pub fn path(&self) -> &str { self.inner.uri().path() }
    pub fn headers(&self) -> &HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &[u8] { self.inner.body() }

    /// The underlying request, for anything this envelope does not expose.
    pub fn raw(&self) -> &http::Request<Bytes> { &self.inner }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`. Names the route does not declare return `None`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params { &self.params }

    /// Decodes the body as JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(self.inner.body())?)
    }

    /// `scheme://host` of this request, from the absolute URI or the `Host`
    /// header. Scheme defaults to `http` when the host server does not say.
    pub fn base_url(&self) -> Option<String> {
        let uri = self.inner.uri();
        let scheme = uri.scheme_str().unwrap_or("http");
        let host = match uri.authority() {
            Some(authority) => authority.as_str(),
            None => self.header(http::header::HOST.as_str())?,
        };
        Some(format!("{scheme}://{host}"))
    }

    /// Absolute URL for `path` on the host this request came in on.
    pub fn url_for(&self, path: &str) -> Option<String> {
        let base = self.base_url()?;
        if path.starts_with('/') {
            Some(format!("{base}{path}"))
        } else {
            Some(format!("{base}/{path}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, body: &'static str) -> Request {
        let raw = http::Request::builder()
            .uri(uri)
            .header("Host", "api.example.com")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap();
        let params = Params::from([("id".to_owned(), "42".to_owned())]);
        Request::new(raw, params)
    }

    #[test]
    fn params_and_missing_params() {
        let req = request("/users/42", "");
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.param("name"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request("/", "");
        assert_eq!(req.header("host"), Some("api.example.com"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn decode_json_body() {
        #[derive(serde::Deserialize)]
        struct Input {
            name: String,
        }
        let req = request("/users", r#"{"name":"alice"}"#);
        let input: Input = req.decode_json().unwrap();
        assert_eq!(input.name, "alice");

        let bad = request("/users", "{");
        assert!(matches!(bad.decode_json::<Input>(), Err(Error::Json(_))));
    }

    #[test]
    fn urls_from_host_header() {
        let req = request("/users/42?x=1", "");
        assert_eq!(req.base_url().as_deref(), Some("http://api.example.com"));
        assert_eq!(req.url_for("users/7").as_deref(), Some("http://api.example.com/users/7"));
        assert_eq!(req.url_for("/users/7").as_deref(), Some("http://api.example.com/users/7"));
    }

    #[test]
    fn urls_from_absolute_uri() {
        let req = request("https://edge.example.com/users/42", "");
        assert_eq!(req.base_url().as_deref(), Some("https://edge.example.com"));
    }
}
