use std::io;

use thiserror::Error;

/// Failures that can abort a VU's setup sequence. Each variant maps to one
/// stage of `connect`; none of them is retried inside this crate — retry
/// policy belongs to the harness's iteration loop.
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied key material did not decode. Raised before any network
    /// activity happens.
    #[error("invalid key: {0}")]
    InvalidKey(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Dialing the storage node failed or timed out. `endpoint` is the
    /// caller's endpoint string, byte for byte.
    #[error("dial endpoint: {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The session-creation exchange failed in transport, or the node
    /// reported a failure status, or the response was truncated.
    #[error("session create: {0}")]
    Session(#[source] io::Error),

    /// The node returned a session id that is not exactly 16 bytes.
    #[error("session token: expected 16 byte id, got {len} bytes")]
    MalformedToken { len: usize },

    /// The node's session public key did not decode as a SEC1 point on the
    /// expected curve.
    #[error("invalid public session key: {0}")]
    InvalidPublicKey(#[source] p256::ecdsa::Error),
}
