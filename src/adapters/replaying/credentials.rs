//! Replaying adapter for the `TicketIssuer` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{Ticket, TicketIssuer, TicketRequest};

/// Serves recorded ticket operations from a cassette.
pub struct ReplayingTicketIssuer {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingTicketIssuer {
    /// Creates a replaying issuer backed by `replayer`.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl TicketIssuer for ReplayingTicketIssuer {
    fn acquire(
        &self,
        _request: &TicketRequest,
    ) -> Result<Ticket, Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "credentials", "acquire"))
    }

    fn destroy(&self, _ticket: &Ticket) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        replay_result(next_output(&self.replayer, "credentials", "destroy"))
    }
}
