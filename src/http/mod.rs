//! HTTP server module with optional TLS.
//!
//! Two listener modes:
//! - **None**: Plain HTTP (development or behind a TLS-terminating proxy)
//! - **Manual**: User-provided certificate and key files
//!
//! Both modes shut down gracefully on SIGTERM/SIGINT. Manual mode reloads
//! certificates on SIGHUP.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
