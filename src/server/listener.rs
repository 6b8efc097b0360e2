use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::{ServerConfig, StaticFilesConfig};
use crate::guard::Guard;
use crate::http::connection::Connection;

/// Creates the listening socket with address reuse enabled.
///
/// Must be called inside a runtime, and while the process still has the
/// rights to bind the configured port.
pub fn bind(cfg: &ServerConfig) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from((cfg.bind_addr, cfg.port));

    let socket = TcpSocket::new_v4().context("socket")?;
    socket
        .set_reuseaddr(true)
        .context("setsockopt(SO_REUSEADDR)")?;
    socket.bind(addr).with_context(|| format!("bind {addr}"))?;
    let listener = socket.listen(cfg.backlog).context("listen")?;

    info!("Listening on {}", addr);
    Ok(listener)
}

/// Accepts connections forever, handling each in its own task.
///
/// Accept errors are logged and skipped. Finished tasks are reaped before
/// each accept without waiting on unfinished ones.
pub async fn run(
    listener: TcpListener,
    static_files: StaticFilesConfig,
    deadline: Duration,
) -> anyhow::Result<()> {
    let mut tasks = JoinSet::new();

    loop {
        reap(&mut tasks);

        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Accept failed: {}", e);
                continue;
            }
        };
        info!(%peer, "Accepted connection");

        tasks.spawn(handle(socket, peer, static_files.clone(), deadline));
    }
}

/// One connection's execution context: fresh guard, hard deadline.
async fn handle(socket: TcpStream, peer: SocketAddr, static_files: StaticFilesConfig, deadline: Duration) {
    let _ = contain(peer, async move {
        let mut conn = Connection::new(socket, static_files, Guard::new());

        match timeout(deadline, conn.run()).await {
            Ok(Ok(Some(bytes))) => info!(%peer, bytes, "Connection finished"),
            Ok(Ok(None)) => info!(%peer, "Connection finished without a file"),
            Ok(Err(e)) => error!("Connection error from {}: {}", peer, e),
            Err(_) => warn!(%peer, "Deadline of {:?} elapsed, closing connection", deadline),
        }
    })
    .await;
}

/// Runs `work` in its own task so a panic, such as a guard violation, is
/// caught here and logged against `peer`.
pub(crate) async fn contain<F>(peer: SocketAddr, work: F) -> Result<(), JoinError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let outcome = tokio::spawn(work).await;
    if let Err(e) = &outcome {
        error!(%peer, "Connection task terminated abnormally: {}", e);
    }
    outcome
}

fn reap(tasks: &mut JoinSet<()>) {
    while let Some(finished) = tasks.try_join_next() {
        if let Err(e) = finished {
            error!("Connection supervisor terminated abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    #[tokio::test]
    async fn contained_panic_is_reported() {
        let outcome = contain(peer(), async { panic!("guard tripped"); }).await;

        let err = outcome.unwrap_err();
        assert!(err.is_panic());
    }

    #[tokio::test]
    async fn contained_work_runs_to_completion() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let outcome = contain(peer(), async move {
            let _ = tx.send(7u8);
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn supervisor_survives_a_panicking_connection() {
        let mut tasks = JoinSet::new();
        tasks.spawn(async {
            let _ = contain(peer(), async { panic!("guard tripped"); }).await;
        });

        let finished = tasks.join_next().await.unwrap();
        assert!(finished.is_ok());
        reap(&mut tasks);
        assert!(tasks.is_empty());
    }
}
