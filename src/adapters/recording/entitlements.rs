//! Recording adapter for the `EntitlementService` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{EntitlementService, Ticket};

/// Records entitlement service calls while delegating to an inner client.
pub struct RecordingEntitlementService {
    inner: Box<dyn EntitlementService>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingEntitlementService {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(
        inner: Box<dyn EntitlementService>,
        recorder: Arc<Mutex<CassetteRecorder>>,
    ) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct MutationInput<'a> {
    user: &'a str,
    entitlement: &'a str,
}

#[derive(Serialize)]
struct ListInput<'a> {
    user: &'a str,
}

impl EntitlementService for RecordingEntitlementService {
    fn grant(
        &self,
        ticket: &Ticket,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.grant(ticket, user, entitlement);
        let input = MutationInput { user, entitlement };
        record_result(&self.recorder, "entitlements", "grant", &input, &result);
        result
    }

    fn revoke(
        &self,
        ticket: &Ticket,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.revoke(ticket, user, entitlement);
        let input = MutationInput { user, entitlement };
        record_result(&self.recorder, "entitlements", "revoke", &input, &result);
        result
    }

    fn list(
        &self,
        ticket: &Ticket,
        user: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let result = self.inner.list(ticket, user);
        record_result(&self.recorder, "entitlements", "list", &ListInput { user }, &result);
        result
    }
}
