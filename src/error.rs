//! Unified error type.

/// Boxed error accepted from handlers that return `Result<(), E>`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by trellis's fallible operations.
///
/// Routing misses (404, 405) are not errors: they are ordinary responses.
/// This type surfaces configuration mistakes found while compiling the route
/// table, plus the encoding and I/O failures a handler may propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("invalid http method `{0}`")]
    InvalidMethod(String),

    #[error("route conflict on `{method} {pattern}`: {reason}")]
    RouteConflict { method: String, pattern: String, reason: String },

    #[error("status route `{path}` collides with a user route")]
    StatusRouteConflict { path: &'static str },

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_pattern(pattern: &str, reason: &'static str) -> Self {
        Self::InvalidPattern { pattern: pattern.to_owned(), reason }
    }

    /// `true` for mistakes in the route table or server setup, found before
    /// anything is served.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidPattern { .. }
                | Self::InvalidMethod(_)
                | Self::RouteConflict { .. }
                | Self::StatusRouteConflict { .. }
                | Self::Addr(_)
        )
    }
}
