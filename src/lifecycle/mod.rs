//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast → HttpServer stops accepting → in-flight
//!     requests drain → run() returns
//! ```
//!
//! # Design Decisions
//! - Ordered startup in main: config, logging, listener, server
//! - One broadcast channel; every long-running task subscribes

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
