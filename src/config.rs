use std::env;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings. The port comes from the command line, everything else
/// from `WARDEN_*` environment variables with built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: Ipv4Addr,
    pub port: u16,
    pub backlog: u32,
    /// Account the process switches to after binding
    pub run_as: String,
    /// Lifetime limit of one connection
    pub deadline: Duration,
}

/// What each connection needs to find files.
#[derive(Debug, Clone)]
pub struct StaticFilesConfig {
    /// Directory request targets are resolved against
    pub root: PathBuf,
    /// Target served for `/`, `/index.htm` and `/index.html`
    pub default_document: String,
}

impl Config {
    pub fn load(port: u16) -> Self {
        let server = ServerConfig {
            bind_addr: parsed_var("WARDEN_BIND", Ipv4Addr::UNSPECIFIED),
            port,
            backlog: parsed_var("WARDEN_BACKLOG", 5),
            run_as: env::var("WARDEN_USER").unwrap_or_else(|_| "nobody".to_string()),
            deadline: Duration::from_secs(parsed_var("WARDEN_DEADLINE_SECS", 10)),
        };

        let static_files = StaticFilesConfig {
            root: env::var("WARDEN_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            default_document: env::var("WARDEN_INDEX")
                .unwrap_or_else(|_| "/index.html".to_string()),
        };

        Self {
            server,
            static_files,
        }
    }
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
