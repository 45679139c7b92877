//! Credentialed access to the entitlement service.
//!
//! All mutations happen inside an [`EntitlementSession`], which owns the
//! service ticket for its lifetime. The ticket is destroyed exactly once:
//! by [`EntitlementSession::close`] or, failing that, when the session drops.

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ports::{EntitlementService, Ticket, TicketIssuer, TicketRequest};
use crate::reconcile::Change;

/// Factory for credentialed sessions against the entitlement service.
pub struct EntitlementClient<'a> {
    issuer: &'a dyn TicketIssuer,
    service: &'a dyn EntitlementService,
    request: TicketRequest,
    entitlement_base: String,
}

impl<'a> EntitlementClient<'a> {
    /// Creates a client using the configured principal, keytab and cache.
    #[must_use]
    pub fn new(
        issuer: &'a dyn TicketIssuer,
        service: &'a dyn EntitlementService,
        settings: &Settings,
    ) -> Self {
        let api = &settings.entitlement_api;
        Self {
            issuer,
            service,
            request: TicketRequest {
                principal: api.principal.clone(),
                keytab: api.keytab.clone(),
                cache: api.cache_file.clone(),
            },
            entitlement_base: settings.entitlement_base.clone(),
        }
    }

    /// Acquires the service ticket and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if no ticket can be obtained.
    pub fn open(&self) -> Result<EntitlementSession<'_>> {
        let ticket = self
            .issuer
            .acquire(&self.request)
            .map_err(|e| Error::Credential(format!("acquiring ticket: {e}")))?;
        debug!(principal = %self.request.principal, "service ticket acquired");
        Ok(EntitlementSession { client: self, ticket, released: false })
    }
}

/// An open, credentialed session.
pub struct EntitlementSession<'a> {
    client: &'a EntitlementClient<'a>,
    ticket: Ticket,
    released: bool,
}

impl EntitlementSession<'_> {
    /// Grants `entitlement` to `user`. Repeating a grant is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mutation`] if the service rejects the grant.
    pub fn add(&self, entitlement: &str, user: &str) -> Result<()> {
        let qualified = self.qualify(entitlement);
        self.client
            .service
            .grant(&self.ticket, user, &qualified)
            .map_err(|e| mutation_error(entitlement, Change::Add, user, &*e))
    }

    /// Revokes `entitlement` from `user`. Repeating a revoke is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mutation`] if the service rejects the revoke.
    pub fn remove(&self, entitlement: &str, user: &str) -> Result<()> {
        let qualified = self.qualify(entitlement);
        self.client
            .service
            .revoke(&self.ticket, user, &qualified)
            .map_err(|e| mutation_error(entitlement, Change::Remove, user, &*e))
    }

    /// Grants or revokes depending on `change`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mutation`] if the service rejects the change.
    pub fn apply(&self, change: Change, entitlement: &str, user: &str) -> Result<()> {
        match change {
            Change::Add => self.add(entitlement, user),
            Change::Remove => self.remove(entitlement, user),
        }
    }

    /// Fully-qualified entitlements currently held by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolve`] if the service cannot answer.
    pub fn get(&self, user: &str) -> Result<Vec<String>> {
        self.client
            .service
            .list(&self.ticket, user)
            .map_err(|e| Error::Resolve(format!("entitlements of {user}: {e}")))
    }

    /// Destroys the ticket, reporting failure to do so.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if the ticket cache cannot be destroyed.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.release().map_err(|e| Error::Credential(format!("destroying ticket: {e}")))
    }

    fn release(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        debug!("destroying service ticket");
        self.client.issuer.destroy(&self.ticket)
    }

    fn qualify(&self, entitlement: &str) -> String {
        format!("{}{entitlement}", self.client.entitlement_base)
    }
}

impl Drop for EntitlementSession<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = self.release() {
                warn!(error = %e, "failed to destroy service ticket");
            }
        }
    }
}

fn mutation_error(
    entitlement: &str,
    operation: Change,
    user: &str,
    cause: &(dyn std::error::Error + Send + Sync),
) -> Error {
    Error::Mutation {
        entitlement: entitlement.to_string(),
        operation,
        user: user.to_string(),
        cause: cause.to_string(),
    }
}
