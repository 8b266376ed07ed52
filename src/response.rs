//! Response envelope and the JSON error helpers.
//!
//! Handlers write through a [`ResponseWriter`]: set headers, commit the status
//! once, then stream bytes or JSON. The dispatcher turns the writer into the
//! final `http::Response` after the handler returns, finishing the gzip stream
//! if one was opened.

use std::fmt;
use std::io::{self, Write};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use serde::Serialize;
use tracing::warn;

use crate::error::Error;

/// Collects one response.
///
/// Two flags are resolved before the handler runs: `gzip` (enabled in the
/// configuration *and* accepted by the client) and `indent` (pretty JSON).
/// The status line and headers are committed at most once: by
/// [`write_header`](Self::write_header), or implicitly as `200 OK` by the
/// first body write.
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    encoder: Option<GzEncoder<Vec<u8>>>,
    gzip: bool,
    indent: bool,
    wrote_header: bool,
}

impl ResponseWriter {
    pub(crate) fn new(gzip: bool, indent: bool) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            encoder: None,
            gzip,
            indent,
            wrote_header: false,
        }
    }

    /// The status committed so far (`200` until something else is written).
    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn is_gzip(&self) -> bool { self.gzip }
    pub fn is_indent(&self) -> bool { self.indent }
    pub fn wrote_header(&self) -> bool { self.wrote_header }

    /// Sets a header. Returns `false`, leaving the headers untouched, once the
    /// status line has been committed.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        if self.wrote_header {
            warn!(header = %name, "header set after the status was written; ignored");
            return false;
        }
        self.headers.insert(name, value);
        true
    }

    /// Commits the status line and headers. Later calls are ignored.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            warn!(
                current = self.status.as_u16(),
                ignored = status.as_u16(),
                "status already written"
            );
            return;
        }
        if self.gzip {
            self.headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            self.headers.append(header::VARY, HeaderValue::from_static("Accept-Encoding"));
        }
        self.status = status;
        self.wrote_header = true;
    }

    /// Serializes `value` as the body.
    ///
    /// Compact by default, two-space indented when the writer was built with
    /// indentation on. Sets `Content-Type: application/json` unless the
    /// handler already chose a content type.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let bytes = if self.indent {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        if !self.wrote_header && !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        self.write_all(&bytes)?;
        Ok(())
    }

    /// Closes the compression stream and assembles the response.
    pub(crate) fn finish(mut self) -> io::Result<http::Response<Bytes>> {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        let body = match self.encoder.take() {
            Some(encoder) => encoder.finish()?,
            None => {
                // nothing was compressed, so nothing is encoded
                if self.gzip {
                    self.headers.remove(header::CONTENT_ENCODING);
                }
                self.body
            }
        };

        let mut response = http::Response::new(Bytes::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        Ok(response)
    }
}

impl fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("gzip", &self.gzip)
            .field("indent", &self.indent)
            .field("wrote_header", &self.wrote_header)
            .finish_non_exhaustive()
    }
}

impl Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        if self.gzip {
            self.encoder
                .get_or_insert_with(|| GzEncoder::new(Vec::new(), Compression::default()))
                .write(buf)
        } else {
            self.body.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.flush(),
            None => Ok(()),
        }
    }
}

// ── JSON error helpers ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Writes `{"error": message}` with the given status.
pub fn error(w: &mut ResponseWriter, message: &str, status: StatusCode) -> Result<(), Error> {
    w.set_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    w.write_header(status);
    w.write_json(&ErrorBody { error: message })
}

/// Writes the standard 404 body.
pub fn not_found(w: &mut ResponseWriter) -> Result<(), Error> {
    error(w, "Resource not found", StatusCode::NOT_FOUND)
}

/// A plain-text response built outside any handler.
pub(crate) fn plain(status: StatusCode, text: String) -> http::Response<Bytes> {
    let mut response = http::Response::new(Bytes::from(text));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
