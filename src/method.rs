//! HTTP method as a typed enum, plus the normalization every route goes through.
//!
//! Routes are stored under the uppercase wire name of their method, so
//! `"get"`, `"Get"` and [`Method::Get`] all land in the same slot. Methods
//! outside this enum (WebDAV verbs, `PURGE`, ...) are still accepted as
//! strings by [`Route::new`](crate::Route::new).

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The RFC 9110 methods.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Parses a method name, ignoring ASCII case.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(Error::InvalidMethod(s.to_owned())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Uppercases `method` and checks it is a valid HTTP token.
pub(crate) fn normalize(method: &str) -> Result<String, Error> {
    let upper = method.to_ascii_uppercase();
    http::Method::from_bytes(upper.as_bytes())
        .map_err(|_| Error::InvalidMethod(method.to_owned()))?;
    Ok(upper)
}
