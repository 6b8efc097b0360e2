use std::fmt;

/// HTTP request methods the server acts on.
///
/// Only `GET` is served. Any other method gets the connection closed without
/// a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string names a method the server serves, `None`
    /// otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use warden::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }
}

/// Protocol versions the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// Recognises exactly `HTTP/1.0` and `HTTP/1.1`.
    ///
    /// ```
    /// # use warden::http::request::Version;
    /// assert_eq!(Version::from_token("HTTP/1.1"), Some(Version::Http11));
    /// assert_eq!(Version::from_token("HTTP/2.0"), None);
    /// ```
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    /// The digit after `HTTP/1.`.
    pub fn minor(&self) -> u8 {
        match self {
            Version::Http10 => 0,
            Version::Http11 => 1,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/1.{}", self.minor())
    }
}

/// A request line the server has agreed to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Always [`Method::GET`] for a parsed request
    pub method: Method,
    /// File to serve: the default document, or the raw path with the query
    /// suffix removed
    pub target: String,
    pub version: Version,
    /// Everything after the first `?`, later `?` separators included. Kept
    /// for logging only
    pub query: Option<String>,
}
