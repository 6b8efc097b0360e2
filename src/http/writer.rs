use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::error;

use crate::guard::Guard;
use crate::http::request::Version;
use crate::http::response::{NOT_FOUND_BODY, ResponseHead};

/// Size of each read from the served file.
pub const CHUNK_SIZE: usize = 1024;

#[derive(Debug)]
pub enum ServeError {
    /// Missing or not a regular file; a 404 was sent.
    NotFound(PathBuf),
    /// The peer stopped accepting bytes partway through a chunk.
    ShortWrite { expected: usize, written: usize },
    Io(io::Error),
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::NotFound(path) => write!(f, "file not found: {}", path.display()),
            ServeError::ShortWrite { expected, written } => {
                write!(f, "short write: {written} of {expected} bytes")
            }
            ServeError::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for ServeError {}

impl From<io::Error> for ServeError {
    fn from(e: io::Error) -> Self {
        ServeError::Io(e)
    }
}

/// Writes one buffer, failing if the peer accepts fewer bytes than given.
pub struct ResponseWriter<'a> {
    buffer: &'a [u8],
    written: usize,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, written: 0 }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> Result<usize, ServeError>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(ServeError::ShortWrite {
                    expected: self.buffer.len(),
                    written: self.written,
                });
            }

            self.written += n;
        }

        Ok(self.written)
    }
}

/// Sends the file at `path` as a complete response and returns the number
/// of body bytes sent.
///
/// `Content-Length` is the size reported by `stat` (symlinks followed) at
/// open time. If the file changes while it is being streamed, the header and
/// body can disagree. A missing file gets a 404 and
/// [`ServeError::NotFound`]. Output is flushed before returning either way.
pub async fn serve_file<W>(
    version: Version,
    path: &Path,
    stream: &mut W,
    guard: &Guard,
) -> Result<u64, ServeError>
where
    W: AsyncWrite + Unpin,
{
    let frame = guard.enter();
    let result = send_file(version, path, stream).await;
    guard.leave(frame, result)
}

async fn send_file<W>(version: Version, path: &Path, stream: &mut W) -> Result<u64, ServeError>
where
    W: AsyncWrite + Unpin,
{
    let Some((mut file, size)) = open_regular(path).await else {
        error!("File not found: {}", path.display());
        send_not_found(version, stream).await?;
        return Err(ServeError::NotFound(path.to_path_buf()));
    };

    let head = ResponseHead::ok(version, size).to_bytes();
    ResponseWriter::new(&head).write_to_stream(stream).await?;

    let mut total = 0u64;
    let mut chunk = BytesMut::with_capacity(CHUNK_SIZE);
    loop {
        chunk.clear();
        let n = file.read_buf(&mut chunk).await?;
        if n == 0 {
            break;
        }

        ResponseWriter::new(&chunk).write_to_stream(stream).await?;
        total += n as u64;
    }

    stream.flush().await?;
    Ok(total)
}

/// Opens `path` if, after following symlinks, it names a regular file, and
/// returns it with its size.
async fn open_regular(path: &Path) -> Option<(File, u64)> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if !meta.is_file() {
        return None;
    }
    let file = File::open(path).await.ok()?;
    Some((file, meta.len()))
}

async fn send_not_found<W>(version: Version, stream: &mut W) -> Result<(), ServeError>
where
    W: AsyncWrite + Unpin,
{
    // Status line echoes the request's version: a 1.0 request gets `HTTP/1.0 404`.
    let mut buf = ResponseHead::not_found(version).to_bytes();
    buf.extend_from_slice(NOT_FOUND_BODY.as_bytes());

    ResponseWriter::new(&buf).write_to_stream(stream).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts `limit` bytes, then reports a closed peer.
    struct Stalling {
        limit: usize,
        taken: usize,
    }

    impl AsyncWrite for Stalling {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let n = buf.len().min(self.limit - self.taken);
            self.taken += n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn short_write_is_reported() {
        let mut out = Stalling { limit: 3, taken: 0 };
        let err = ResponseWriter::new(b"hello")
            .write_to_stream(&mut out)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServeError::ShortWrite {
                expected: 5,
                written: 3
            }
        ));
    }

    #[tokio::test]
    async fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let guard = Guard::new();
        let mut out = Vec::new();

        let err = serve_file(Version::Http11, dir.path(), &mut out, &guard)
            .await
            .unwrap_err();

        assert!(matches!(err, ServeError::NotFound(_)));
        assert!(out.starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn not_found_follows_request_version() {
        let dir = tempfile::tempdir().unwrap();
        let guard = Guard::new();
        let mut out = Vec::new();

        let err = serve_file(Version::Http10, &dir.path().join("absent"), &mut out, &guard)
            .await
            .unwrap_err();

        assert!(matches!(err, ServeError::NotFound(_)));
        assert!(out.starts_with(b"HTTP/1.0 404 Not Found\r\n"));
        assert!(out.ends_with(NOT_FOUND_BODY.as_bytes()));
    }
}
