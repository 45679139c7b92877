//! Entitlement service port.

use super::credentials::Ticket;

/// Mutates and reads entitlements held by users.
///
/// Both mutations are idempotent: repeating a grant or revoke leaves the same
/// end state. `entitlement` is always fully qualified.
pub trait EntitlementService: Send + Sync {
    /// Grants `entitlement` to `user`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-2xx response or a transport failure.
    fn grant(
        &self,
        ticket: &Ticket,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Revokes `entitlement` from `user`.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-2xx response or a transport failure.
    fn revoke(
        &self,
        ticket: &Ticket,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Lists the fully-qualified entitlements `user` currently holds.
    ///
    /// # Errors
    ///
    /// Returns an error on a non-2xx response or a transport failure.
    fn list(
        &self,
        ticket: &Ticket,
        user: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;
}
