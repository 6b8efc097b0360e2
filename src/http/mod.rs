//! HTTP protocol implementation.
//!
//! Just enough HTTP/1.x to answer a single `GET` with a file and close.
//!
//! # Architecture
//!
//! - **`tokenizer`**: bounded splitting of a line into a fixed number of tokens
//! - **`parser`**: classifies a request line as recognised or not
//! - **`request`**: method, version and parsed request types
//! - **`response`**: status codes and response heads
//! - **`writer`**: writes response heads and streams files
//! - **`connection`**: the per-connection state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitRequestLine │ ← Read one bounded line
//!        └────────┬─────────┘
//!                 │ Recognized / Unrecognized / EOF
//!                 ▼
//!        ┌──────────────────┐
//!        │   DrainHeaders   │ ← Discard lines up to the blank one
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │     Respond      │ ← File or 404 if recognised, nothing otherwise
//!        └────────┬─────────┘
//!                 ▼
//!        ┌──────────────────┐
//!        │      Closed      │ ← Always reached, errors included
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use warden::config::StaticFilesConfig;
//! use warden::guard::Guard;
//! use warden::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let static_files = StaticFilesConfig {
//!         root: ".".into(),
//!         default_document: "/index.html".into(),
//!     };
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let static_files = static_files.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, static_files, Guard::new());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod tokenizer;
pub mod writer;
