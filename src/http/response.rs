use crate::http::request::Version;

/// Body sent with every 404.
pub const NOT_FOUND_BODY: &str = "<HTML><BODY>File not found</BODY></HTML>\n";

/// HTTP status codes the server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use warden::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Status line and headers of a response. The body is written separately so
/// file contents can be streamed instead of buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub version: Version,
    pub status: StatusCode,
    /// Header lines in the order they are written
    pub headers: Vec<(String, String)>,
}

/// Builder for constructing response heads in a fluent style.
///
/// # Example
///
/// ```
/// # use warden::http::request::Version;
/// # use warden::http::response::{ResponseBuilder, StatusCode};
/// let head = ResponseBuilder::new(Version::Http11, StatusCode::Ok)
///     .header("Content-Length", "5")
///     .build();
/// assert_eq!(head.to_bytes(), b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");
/// ```
pub struct ResponseBuilder {
    version: Version,
    status: StatusCode,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn new(version: Version, status: StatusCode) -> Self {
        Self {
            version,
            status,
            headers: Vec::new(),
        }
    }

    /// Appends a header line. Duplicates are not merged.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> ResponseHead {
        ResponseHead {
            version: self.version,
            status: self.status,
            headers: self.headers,
        }
    }
}

impl ResponseHead {
    /// Head of a successful file response.
    pub fn ok(version: Version, content_length: u64) -> Self {
        ResponseBuilder::new(version, StatusCode::Ok)
            .header("Content-Length", content_length.to_string())
            .build()
    }

    /// Head of a 404. Carries no `Content-Length`; the body runs to close.
    pub fn not_found(version: Version) -> Self {
        ResponseBuilder::new(version, StatusCode::NotFound)
            .header("Content-Type", "text/html; charset=utf-8")
            .build()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Serializes the status line, headers and the blank separator line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);

        let status_line = format!(
            "{} {} {}\r\n",
            self.version,
            self.status.as_u16(),
            self.status.reason_phrase()
        );
        buf.extend_from_slice(status_line.as_bytes());

        for (k, v) in &self.headers {
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(v.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}
