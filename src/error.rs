//! Error taxonomy for the autopilot.
//!
//! `ProtocolDrift` means the remote flow no longer matches what we expect;
//! it is surfaced verbatim and never retried, because retrying cannot fix a
//! shape mismatch. Transport-level errors carry the underlying reqwest
//! error; bounded retry already happened inside the HTTP layer before one
//! of these escapes.

/// All errors produced by the autopilot library.
#[derive(thiserror::Error, Debug)]
pub enum PilotError {
    /// The remote login or profile flow changed shape.
    #[error("protocol drift: {0}")]
    ProtocolDrift(String),

    /// The identity provider answered with a non-200 status.
    #[error("authentication server returned HTTP {0}")]
    AuthServer(u16),

    /// The portal entry point redirected somewhere we do not recognize.
    #[error("unexpected redirect target: {0}")]
    UnexpectedRedirect(String),

    /// The session cookie is no longer accepted by the platform.
    #[error("session expired: the platform redirected back to its login page")]
    SessionExpired,

    /// The identity provider rejected the credentials.
    #[error("login rejected: {0}")]
    InvalidCredentials(String),

    /// A course reference URL is missing `cid` or `classid`.
    #[error("malformed course reference: {0}")]
    MalformedReference(String),

    /// A tracking record is missing its required nested fields.
    #[error("malformed tracking record: {0}")]
    MalformedRecord(String),

    /// No account id could be extracted from the profile page.
    #[error("no account id found on the profile page")]
    IdentifierNotFound,

    /// Transport failure after the HTTP layer exhausted its retries.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PilotError>;
