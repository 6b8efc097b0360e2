use tracing::{debug, info};

use crate::guard::Guard;
use crate::http::request::{Method, Request, Version};
use crate::http::tokenizer::{self, MAX_SPLITS};

/// Targets answered with the default document.
const INDEX_ALIASES: [&str; 3] = ["/", "/index.htm", "/index.html"];

/// Why a request line was not recognised.
///
/// None of these produce a response; the connection is simply closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line did not split into exactly method, target and version.
    /// Zero tokens means the line was over the length limit.
    TokenCount(usize),
    InvalidMethod(String),
    InvalidVersion(String),
}

/// Cuts `line` at its first `\r` or `\n`.
pub fn strip_newline<'a>(line: &'a str, guard: &Guard) -> &'a str {
    let frame = guard.enter();
    let end = line.find(['\r', '\n']).unwrap_or(line.len());
    guard.leave(frame, &line[..end])
}

/// Classifies one request line (without its line terminator).
///
/// Only `GET` with `HTTP/1.0` or `HTTP/1.1` is recognised. Index aliases
/// resolve to `default_document`; every other path is passed through as-is.
pub fn parse_request_line(
    line: &str,
    default_document: &str,
    guard: &Guard,
) -> Result<Request, ParseError> {
    let frame = guard.enter();
    let result = classify(line, default_document, guard);
    guard.leave(frame, result)
}

fn classify(line: &str, default_document: &str, guard: &Guard) -> Result<Request, ParseError> {
    let parts = tokenizer::split(line, " ", MAX_SPLITS, guard);
    debug!("First pass: Splits = {}", parts.len());

    let (Some(method), Some(raw_target), Some(version), 3) =
        (parts.get(0), parts.get(1), parts.get(2), parts.len())
    else {
        return Err(ParseError::TokenCount(parts.len()));
    };

    if Method::from_str(method) != Some(Method::GET) {
        return Err(ParseError::InvalidMethod(method.to_owned()));
    }

    let version =
        Version::from_token(version).ok_or_else(|| ParseError::InvalidVersion(version.to_owned()))?;

    let target_parts = tokenizer::split(raw_target, "?", MAX_SPLITS, guard);
    debug!("Second pass: Splits = {}", target_parts.len());

    let path = target_parts.get(0).unwrap_or_default();
    let target = if INDEX_ALIASES.contains(&path) {
        info!("Found HTTP request for {}", default_document);
        default_document.to_owned()
    } else {
        info!(path, "Requesting file");
        path.to_owned()
    };

    let suffixes: Vec<&str> = target_parts.iter().skip(1).collect();
    for suffix in &suffixes {
        debug!("Query suffix: ?{}", suffix);
    }
    let query = (!suffixes.is_empty()).then(|| suffixes.join("?"));

    Ok(Request {
        method: Method::GET,
        target,
        version,
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let guard = Guard::new();
        let req = parse_request_line("GET /a.txt HTTP/1.1", "/index.html", &guard).unwrap();

        assert_eq!(req.target, "/a.txt");
        assert_eq!(req.version, Version::Http11);
        assert_eq!(req.query, None);
    }

    #[test]
    fn every_query_segment_is_kept() {
        let guard = Guard::new();
        let req = parse_request_line("GET /a?b=1?c=2 HTTP/1.1", "/index.html", &guard).unwrap();

        assert_eq!(req.target, "/a");
        assert_eq!(req.query.as_deref(), Some("b=1?c=2"));
    }

    #[test]
    fn strip_newline_cuts_at_first_terminator() {
        let guard = Guard::new();
        assert_eq!(strip_newline("GET / HTTP/1.1\r\n", &guard), "GET / HTTP/1.1");
        assert_eq!(strip_newline("a\nb\r\n", &guard), "a");
        assert_eq!(strip_newline("\r\n", &guard), "");
        assert_eq!(strip_newline("none", &guard), "none");
    }
}
