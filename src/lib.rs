//! Session establishment and instrumentation core for FrostFS load
//! generation.
//!
//! Each virtual worker (VU) of the harness calls [`connect`] once during
//! setup. The call resolves or generates a P-256 signing identity, dials a
//! storage node under the configured timeouts, negotiates a session token
//! with it, and hands back a [`ClientHandle`] carrying the identity, the
//! token, the open connection, and references to the run-wide metric sets
//! that object and container operations record into.
//!
//! Operation implementations, payload generation, and the S3 adapter live
//! downstream of the handle; this crate never re-enters them.

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod net;
pub mod session;

pub use client::{connect, connect_from, connect_with, ClientHandle, DEFAULT_BUFFER_SIZE};
pub use config::Config;
pub use error::Error;
pub use net::DialConfig;
pub use session::{SessionToken, SESSION_NO_EXPIRATION};
