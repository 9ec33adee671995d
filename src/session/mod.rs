//! Session negotiation with a storage node.
//!
//! The node's session-creation procedure is opaque to the rest of this
//! crate; its shape is a fixed contract. Request payload:
//! `[version:u8][expiration:u64 BE][key_len:u8][compressed SEC1 key]`.
//! Response payload: `[status:u8][id_len:u8][id][key_len:u8][key]`.
//! A non-zero status covers every permanent failure class the node can
//! report; it is translated into the one [`Error::Session`] shape so callers
//! never see a node-specific error taxonomy.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use p256::ecdsa::VerifyingKey;
use uuid::Uuid;

use crate::error::Error;
use crate::net::Connection;

/// Expiration value meaning "do not expire during the test run".
pub const SESSION_NO_EXPIRATION: u64 = u64::MAX;

pub const SESSION_PROTOCOL_VERSION: u8 = 1;

/// A session id is exactly 16 raw bytes on the wire.
pub const SESSION_ID_LEN: usize = 16;

pub const STATUS_OK: u8 = 0;

/// A negotiated session credential: unique id, the node-side public key the
/// session is bound to, and the expiration epoch it was requested with.
#[derive(Clone, Debug)]
pub struct SessionToken {
    id: Uuid,
    auth_key: VerifyingKey,
    expiration: u64,
}

impl SessionToken {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn auth_key(&self) -> &VerifyingKey {
        &self.auth_key
    }

    pub fn expiration(&self) -> u64 {
        self.expiration
    }
}

/// Exchanges one session-creation request/response over `conn` and locally
/// validates the result.
///
/// No signature verification of the token happens here: trust comes from
/// the transport-layer channel the request traveled over. Validation is
/// purely structural (id length, key encoding).
pub async fn negotiate(conn: &mut Connection, expiration: u64) -> Result<SessionToken, Error> {
    let request = compose_create(conn.identity(), expiration);
    conn.write_frame(&request).await.map_err(Error::Session)?;

    let response = conn.read_frame().await.map_err(Error::Session)?;
    parse_create(&response, expiration)
}

fn compose_create(identity: &[u8], expiration: u64) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(10 + identity.len());
    buf.put_u8(SESSION_PROTOCOL_VERSION);
    buf.put_u64(expiration);
    buf.put_u8(identity.len() as u8);
    buf.put_slice(identity);
    buf.to_vec()
}

fn parse_create(payload: &[u8], expiration: u64) -> Result<SessionToken, Error> {
    let mut buf = payload;

    if buf.remaining() < 2 {
        return Err(Error::Session(truncated()));
    }

    let status = buf.get_u8();
    if status != STATUS_OK {
        return Err(Error::Session(io::Error::other(format!(
            "server status {status}"
        ))));
    }

    let id_len = buf.get_u8() as usize;
    if id_len != SESSION_ID_LEN {
        return Err(Error::MalformedToken { len: id_len });
    }
    if buf.remaining() < SESSION_ID_LEN {
        return Err(Error::Session(truncated()));
    }
    let mut id = [0u8; SESSION_ID_LEN];
    buf.copy_to_slice(&mut id);
    let id = Uuid::from_bytes(id);

    if buf.remaining() < 1 {
        return Err(Error::Session(truncated()));
    }
    let key_len = buf.get_u8() as usize;
    if buf.remaining() < key_len {
        return Err(Error::Session(truncated()));
    }
    let auth_key = VerifyingKey::from_sec1_bytes(&buf[..key_len]).map_err(Error::InvalidPublicKey)?;

    Ok(SessionToken {
        id,
        auth_key,
        expiration,
    })
}

fn truncated() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "truncated session response")
}
