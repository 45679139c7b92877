//! Recording adapter for the `TicketIssuer` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{Ticket, TicketIssuer, TicketRequest};

/// Records ticket acquisition and release while delegating to an inner issuer.
pub struct RecordingTicketIssuer {
    inner: Box<dyn TicketIssuer>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingTicketIssuer {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn TicketIssuer>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl TicketIssuer for RecordingTicketIssuer {
    fn acquire(
        &self,
        request: &TicketRequest,
    ) -> Result<Ticket, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.acquire(request);
        record_result(&self.recorder, "credentials", "acquire", request, &result);
        result
    }

    fn destroy(&self, ticket: &Ticket) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.destroy(ticket);
        record_result(&self.recorder, "credentials", "destroy", ticket, &result);
        result
    }
}
