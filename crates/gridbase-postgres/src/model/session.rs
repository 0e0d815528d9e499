//! Session model for PostgreSQL database operations.

use diesel::prelude::*;
use ipnet::IpNet;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::sessions;

/// An authenticated session.
///
/// The opaque token handed to the client is never stored; only its SHA-256
/// digest is, so a database leak cannot be replayed as a bearer token.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The account this session authenticates.
    pub user_id: Uuid,
    /// SHA-256 digest of the opaque session token.
    pub token_digest: Vec<u8>,
    /// IP address the session was created from.
    pub ip_address: Option<IpNet>,
    /// User agent string of the client that created the session.
    pub user_agent: Option<String>,
    /// Timestamp when the session was issued.
    pub issued_at: Timestamp,
    /// Timestamp after which the session rejects.
    pub expires_at: Timestamp,
    /// Timestamp of the most recent authenticated request.
    pub last_seen_at: Option<Timestamp>,
}

impl Session {
    /// Returns whether the session has expired at the given instant.
    pub fn is_expired_at(&self, now: jiff::Timestamp) -> bool {
        self.expires_at.to_jiff() <= now
    }
}

/// Data for creating a new session.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewSession {
    /// The account this session authenticates.
    pub user_id: Uuid,
    /// SHA-256 digest of the opaque session token.
    pub token_digest: Vec<u8>,
    /// IP address the session was created from.
    pub ip_address: Option<IpNet>,
    /// User agent string of the creating client.
    pub user_agent: Option<String>,
    /// Expiry timestamp.
    pub expires_at: Timestamp,
}
