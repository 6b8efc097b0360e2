use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tracing::{debug, info};

use crate::config::StaticFilesConfig;
use crate::guard::Guard;
use crate::http::parser::{ParseError, parse_request_line, strip_newline};
use crate::http::request::Request;
use crate::http::tokenizer::BUFFER_SIZE;
use crate::http::writer::{ServeError, serve_file};

/// Handles exactly one request on one stream, then closes it.
pub struct Connection<S> {
    stream: BufStream<S>,
    static_files: StaticFilesConfig,
    guard: Guard,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitRequestLine,
    DrainHeaders(Verdict),
    Respond(Verdict),
    Closed,
}

/// Outcome of reading the request line.
#[derive(Debug)]
pub enum Verdict {
    Recognized(Request),
    Unrecognized(ParseError),
    /// The peer closed before sending a request line.
    Empty,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, static_files: StaticFilesConfig, guard: Guard) -> Self {
        Self {
            stream: BufStream::new(stream),
            static_files,
            guard,
            state: ConnectionState::AwaitRequestLine,
        }
    }

    /// Drives the connection to `Closed`.
    ///
    /// Returns the number of body bytes sent, or `None` when no file was
    /// sent. The stream is shut down on every path, including errors.
    pub async fn run(&mut self) -> anyhow::Result<Option<u64>> {
        let frame = self.guard.enter();
        let result = self.drive().await;
        self.close().await;
        self.guard.leave(frame, result)
    }

    async fn drive(&mut self) -> anyhow::Result<Option<u64>> {
        let mut sent = None;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitRequestLine => {
                    let verdict = self.read_request().await?;
                    self.state = ConnectionState::DrainHeaders(verdict);
                }

                ConnectionState::DrainHeaders(verdict) => {
                    self.drain_headers().await?;
                    self.state = ConnectionState::Respond(verdict);
                }

                ConnectionState::Respond(verdict) => {
                    match verdict {
                        Verdict::Recognized(req) => sent = self.respond(&req).await?,
                        Verdict::Unrecognized(e) => info!("Unrecognized request, closing: {:?}", e),
                        Verdict::Empty => {}
                    }
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(sent)
    }

    async fn read_request(&mut self) -> io::Result<Verdict> {
        let Some(raw) = read_bounded_line(&mut self.stream, BUFFER_SIZE, &self.guard).await? else {
            debug!("Connection closed before a request line arrived");
            return Ok(Verdict::Empty);
        };

        let line = strip_newline(&raw, &self.guard);
        info!("Received (first line): {}", line);

        Ok(
            match parse_request_line(line, &self.static_files.default_document, &self.guard) {
                Ok(req) => Verdict::Recognized(req),
                Err(e) => Verdict::Unrecognized(e),
            },
        )
    }

    /// Discards header lines up to and including the first empty one.
    async fn drain_headers(&mut self) -> io::Result<()> {
        while let Some(raw) = read_bounded_line(&mut self.stream, BUFFER_SIZE, &self.guard).await? {
            let line = strip_newline(&raw, &self.guard);
            debug!("Received (subsequent lines): {}", line);

            if line.is_empty() {
                break;
            }
        }
        Ok(())
    }

    async fn respond(&mut self, req: &Request) -> anyhow::Result<Option<u64>> {
        let path = resolve(&self.static_files.root, &req.target);
        info!(path = %path.display(), "Sending file");

        match serve_file(req.version, &path, &mut self.stream, &self.guard).await {
            Ok(n) => {
                info!(bytes = n, "Succeeded sending file");
                Ok(Some(n))
            }
            Err(ServeError::NotFound(_)) => {
                info!("Failed to send file: not found");
                Ok(None)
            }
            Err(e) => Err(anyhow::anyhow!("failed to send {}: {}", path.display(), e)),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown failed: {}", e);
        }
    }
}

/// Maps a request target onto the document root. No normalisation is done;
/// confinement comes from the process-wide root restriction.
pub fn resolve(root: &Path, target: &str) -> PathBuf {
    root.join(target.trim_start_matches('/'))
}

/// Reads one `\n`-terminated line, keeping at most `capacity` bytes of it.
///
/// Bytes past the cap are consumed and dropped up to the newline, so the
/// next read starts on the following line. Returns `None` at EOF when nothing
/// was read. The returned text includes its terminator if it fit.
pub async fn read_bounded_line<R>(
    reader: &mut R,
    capacity: usize,
    guard: &Guard,
) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let frame = guard.enter();
    let result = fill_line(reader, capacity).await;
    guard.leave(frame, result)
}

async fn fill_line<R>(reader: &mut R, capacity: usize) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::with_capacity(capacity);
    let mut seen_any = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        seen_any = true;

        let (taken, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };

        let room = capacity - line.len();
        if taken > room {
            debug!("Line exceeds {} bytes, truncating", capacity);
        }
        line.extend_from_slice(&available[..taken.min(room)]);
        reader.consume(taken);

        if done {
            break;
        }
    }

    if !seen_any {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_line_splits_on_newline() {
        let guard = Guard::new();
        let mut input: &[u8] = b"first\r\nsecond\n";
        assert_eq!(
            read_bounded_line(&mut input, 16, &guard).await.unwrap().as_deref(),
            Some("first\r\n")
        );
        assert_eq!(
            read_bounded_line(&mut input, 16, &guard).await.unwrap().as_deref(),
            Some("second\n")
        );
        assert_eq!(read_bounded_line(&mut input, 16, &guard).await.unwrap(), None);
    }

    #[tokio::test]
    async fn bounded_line_drops_overflow_up_to_newline() {
        let guard = Guard::new();
        let mut input: &[u8] = b"abcdefgh\nnext\n";
        assert_eq!(
            read_bounded_line(&mut input, 4, &guard).await.unwrap().as_deref(),
            Some("abcd")
        );
        assert_eq!(
            read_bounded_line(&mut input, 4, &guard).await.unwrap().as_deref(),
            Some("next")
        );
    }

    #[tokio::test]
    async fn bounded_line_returns_unterminated_tail() {
        let guard = Guard::new();
        let mut input: &[u8] = b"tail";
        assert_eq!(
            read_bounded_line(&mut input, 16, &guard).await.unwrap().as_deref(),
            Some("tail")
        );
    }

    #[test]
    fn resolve_joins_under_root() {
        assert_eq!(resolve(Path::new("/srv"), "/a/b.txt"), Path::new("/srv/a/b.txt"));
        assert_eq!(resolve(Path::new("/"), "/index.html"), Path::new("/index.html"));
    }
}
