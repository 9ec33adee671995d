use ringlog::*;

use crate::config::Config;
use crate::error::Error;
use crate::identity::{self, PrivateKey};
use crate::metrics::{self, OpMetrics};
use crate::net::{Connection, Connector, DialConfig};
use crate::session::{self, SessionToken, SESSION_NO_EXPIRATION};

/// Buffer size handed to operation implementations for payload I/O.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Everything one VU needs to run storage operations: its signing identity,
/// the negotiated session, the open connection, and references to the
/// run-wide metric sets.
///
/// The key, token, and connection are owned exclusively by this handle for
/// the VU's lifetime; only the metric sets are shared across VUs.
pub struct ClientHandle {
    key: PrivateKey,
    token: SessionToken,
    connection: Connection,
    bufsize: usize,
    metrics: OpMetrics,
}

impl ClientHandle {
    pub fn private_key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn session_token(&self) -> &SessionToken {
        &self.token
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.connection
    }

    pub fn buffer_size(&self) -> usize {
        self.bufsize
    }

    pub fn metrics(&self) -> &OpMetrics {
        &self.metrics
    }

    /// Releases the underlying connection. The connection is the only
    /// resource on the handle requiring explicit release.
    pub async fn close(mut self) {
        self.connection.shutdown().await;
    }
}

/// Sets up one VU: resolve the identity, dial the node, negotiate a session,
/// and attach the shared metric sets.
///
/// `hex_private_key == ""` generates a fresh key. Timeouts are whole
/// seconds; zero selects the transport default. One call is one synchronous
/// setup sequence for the calling VU; aborting the run drops the future and
/// cancels any in-flight step.
pub async fn connect(
    endpoint: &str,
    hex_private_key: &str,
    dial_timeout: u64,
    stream_timeout: u64,
) -> Result<ClientHandle, Error> {
    connect_with(
        endpoint,
        hex_private_key,
        DialConfig::from_secs(dial_timeout, stream_timeout),
        SESSION_NO_EXPIRATION,
    )
    .await
}

/// Fully parameterized form of [`connect`].
pub async fn connect_with(
    endpoint: &str,
    hex_private_key: &str,
    dial: DialConfig,
    expiration: u64,
) -> Result<ClientHandle, Error> {
    let key = identity::resolve(hex_private_key)?;

    info!("connecting: endpoint={endpoint}");

    let connector = Connector::new(&key, dial);
    let mut connection = connector.connect(endpoint).await?;

    let token = match session::negotiate(&mut connection, expiration).await {
        Ok(token) => token,
        Err(e) => {
            // don't leak the half-set-up connection
            connection.shutdown().await;
            return Err(e);
        }
    };

    debug!("session established: id={}", token.id());

    Ok(ClientHandle {
        key,
        token,
        connection,
        bufsize: DEFAULT_BUFFER_SIZE,
        metrics: metrics::ops(),
    })
}

/// Connects using the `[target]` and `[client]` sections of a loaded config.
pub async fn connect_from(config: &Config) -> Result<ClientHandle, Error> {
    connect_with(
        config.target().endpoint(),
        config.target().private_key(),
        config.client().dial_config(),
        config.target().session_expiration(),
    )
    .await
}
