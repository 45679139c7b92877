//! Live ticket issuer using the MIT Kerberos command-line tools.

use std::process::Command;

use crate::ports::credentials::{Ticket, TicketIssuer, TicketRequest};

/// Runs `kinit`/`kdestroy` against a dedicated ticket cache.
pub struct LiveTicketIssuer;

impl TicketIssuer for LiveTicketIssuer {
    fn acquire(
        &self,
        request: &TicketRequest,
    ) -> Result<Ticket, Box<dyn std::error::Error + Send + Sync>> {
        let output = Command::new("kinit")
            .arg("-k")
            .arg("-t")
            .arg(&request.keytab)
            .arg(&request.principal)
            .env("KRB5CCNAME", &request.cache)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("kinit for {} failed: {}", request.principal, stderr.trim()).into());
        }
        Ok(Ticket { cache: request.cache.clone() })
    }

    fn destroy(&self, ticket: &Ticket) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let output = Command::new("kdestroy").env("KRB5CCNAME", &ticket.cache).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("kdestroy failed: {}", stderr.trim()).into());
        }
        Ok(())
    }
}
