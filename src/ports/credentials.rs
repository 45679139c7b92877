//! Credential port for ticket-based service authentication.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Everything needed to obtain a service ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    /// Principal to authenticate as.
    pub principal: String,
    /// Keytab holding the principal's key.
    pub keytab: PathBuf,
    /// Ticket cache the ticket is stored in.
    pub cache: PathBuf,
}

/// Handle on an acquired ticket, passed to every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket cache holding the credential.
    pub cache: PathBuf,
}

/// Acquires and destroys service tickets.
pub trait TicketIssuer: Send + Sync {
    /// Obtains a ticket into the requested cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unusable or the KDC refuses.
    fn acquire(
        &self,
        request: &TicketRequest,
    ) -> Result<Ticket, Box<dyn std::error::Error + Send + Sync>>;

    /// Destroys the ticket cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be destroyed.
    fn destroy(&self, ticket: &Ticket) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
