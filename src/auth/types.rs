//! Per-request identity types.

/// Account bound to the current request by the identity middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub account_id: i64,
}

/// The verified token that produced the current [`Identity`].
/// Only used to revoke it on logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedToken {
    /// Signature segment of the JWT
    pub signature: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}
