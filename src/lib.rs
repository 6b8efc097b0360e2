//! Warden - privilege-dropping static file responder
//!
//! Serves one file per connection from a chroot, as an unprivileged user,
//! with every connection isolated in its own deadline-bounded task.

pub mod config;
pub mod guard;
pub mod http;
pub mod server;
