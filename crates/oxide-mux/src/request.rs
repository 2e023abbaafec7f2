//! HTTP request type.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::MuxError;

/// HTTP request methods.
///
/// Method tokens are case-sensitive: `"GET"` parses to [`Method::Get`], while
/// `"get"` is the extension method `get`. Equality and hashing go through
/// [`Method::as_str`], so `Method::Other("GET".into())` equals `Method::Get`.
#[derive(Debug, Clone)]
pub enum Method {
    /// GET method
    Get,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
    /// CONNECT method
    Connect,
    /// TRACE method
    Trace,
    /// Any other method token, e.g. `PROPFIND`.
    Other(String),
}

impl Method {
    /// Returns the method as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Other(token) => token,
        }
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Method {}

impl Hash for Method {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl FromStr for Method {
    type Err = MuxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "CONNECT" => Ok(Self::Connect),
            "TRACE" => Ok(Self::Trace),
            _ if is_token(s) => Ok(Self::Other(s.to_string())),
            _ => Err(MuxError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` for a non-empty HTTP token (`tchar` characters only).
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// HTTP protocol version of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Version {
    /// HTTP/1.0
    Http10,
    /// HTTP/1.1
    #[default]
    Http11,
    /// HTTP/2
    Http2,
}

impl Version {
    /// Returns `true` if connections are persistent unless closed explicitly.
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Http10)
    }
}

/// Path parameters bound by the matched route.
///
/// Created fresh for every match and moved into the request it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    /// Creates new empty path params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parses a parameter as a specific type.
    #[must_use]
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no parameters are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

}

/// An HTTP request as seen by the router.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Value of the `Host` header or authority.
    pub host: String,
    /// Raw request target, e.g. `/a/b?x=1` or `*`.
    pub target: String,
    /// Path component of the target.
    pub path: String,
    /// Query component of the target, without the `?`.
    pub raw_query: Option<String>,
    /// Decoded query string parameters.
    pub query: HashMap<String, String>,
    /// Protocol version.
    pub version: Version,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Vec<u8>,
    /// Parameters bound by the router for this call.
    pub params: PathParams,
}

impl Request {
    /// Creates a new request for the given target.
    #[must_use]
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let target = target.into();
        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.clone(), None),
        };
        let query = raw_query
            .as_deref()
            .map(Self::parse_query_string)
            .unwrap_or_default();

        Self {
            method,
            host: String::new(),
            target,
            path,
            raw_query,
            query,
            version: Version::default(),
            headers: HashMap::new(),
            body: Vec::new(),
            params: PathParams::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::Post, target)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::Put, target)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::Delete, target)
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns `true` for the server-wide `*` target (as in `OPTIONS *`).
    ///
    /// Only the path component is checked, so `*?x` is an asterisk target
    /// too. It is never an origin-form path and is not redirected to `/*`.
    #[must_use]
    pub fn is_asterisk(&self) -> bool {
        self.path == "*"
    }

    /// Gets a path parameter bound by the router.
    ///
    /// Returns `None` for unknown names and for requests matched by a static
    /// route.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Gets a header value.
    #[must_use]
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Gets a query parameter.
    #[must_use]
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Parses query parameters from a query string.
    #[must_use]
    pub fn parse_query_string(query: &str) -> HashMap<String, String> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (urlencoding_decode(key), urlencoding_decode(value))
            })
            .collect()
    }
}

/// Simple URL decoding.
fn urlencoding_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();

    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hex: Vec<u8> = iter.by_ref().take(2).collect();
                let decoded = std::str::from_utf8(&hex)
                    .ok()
                    .filter(|h| h.len() == 2)
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = decoded {
                    bytes.push(byte);
                    continue;
                }
                bytes.push(b'%');
                bytes.extend_from_slice(&hex);
            }
            b'+' => bytes.push(b' '),
            other => bytes.push(other),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
