use std::net::{Ipv4Addr, TcpListener};
use std::path::Path;
use std::time::Duration;

use warden::config::{Config, ServerConfig, StaticFilesConfig};
use warden::server;

/// Holds a loopback port for the whole test, so any attempt to bind it fails.
fn occupied_port() -> (TcpListener, u16) {
    let holder = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = holder.local_addr().unwrap().port();
    (holder, port)
}

fn config(port: u16, run_as: &str, root: &Path) -> Config {
    Config {
        server: ServerConfig {
            bind_addr: Ipv4Addr::LOCALHOST,
            port,
            backlog: 5,
            run_as: run_as.to_string(),
            deadline: Duration::from_secs(1),
        },
        static_files: StaticFilesConfig {
            root: root.to_path_buf(),
            default_document: "/index.html".to_string(),
        },
    }
}

#[tokio::test]
async fn test_unknown_user_fails_before_binding() {
    let dir = tempfile::tempdir().unwrap();
    let (_holder, port) = occupied_port();

    let err = server::start(config(port, "warden-no-such-user", dir.path()))
        .await
        .unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains("getpwnam"), "{message}");
    assert!(!message.contains("bind"), "{message}");
}

#[tokio::test]
async fn test_unknown_user_leaves_port_free() {
    let dir = tempfile::tempdir().unwrap();
    let (holder, port) = occupied_port();
    drop(holder);

    assert!(server::start(config(port, "warden-no-such-user", dir.path())).await.is_err());
    assert!(std::net::TcpStream::connect((Ipv4Addr::LOCALHOST, port)).is_err());
}

#[tokio::test]
async fn test_bind_failure_stops_before_confinement() {
    let dir = tempfile::tempdir().unwrap();
    let (_holder, port) = occupied_port();
    let cwd = std::env::current_dir().unwrap();

    let err = server::start(config(port, "root", dir.path()))
        .await
        .unwrap_err();
    let message = format!("{:#}", err);

    assert!(message.contains("bind"), "{message}");
    assert!(!message.contains("chroot"), "{message}");
    assert_eq!(std::env::current_dir().unwrap(), cwd);
}
