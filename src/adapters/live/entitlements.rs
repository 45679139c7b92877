//! Live adapter for the entitlement service.
//!
//! The service only accepts SPNEGO, so requests go through `curl --negotiate`
//! with the session's ticket cache.

use std::process::Command;

use reqwest::Url;
use serde::Deserialize;

use crate::ports::credentials::Ticket;
use crate::ports::entitlements::EntitlementService;

/// Entitlement service client authenticating with a Kerberos ticket.
pub struct LiveEntitlementService {
    base: Url,
}

#[derive(Deserialize)]
struct UserEntitlements {
    entitlements: Vec<String>,
}

impl LiveEntitlementService {
    /// Creates a client for the per-user resource rooted at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not an absolute http(s) URL.
    pub fn new(url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let base = Url::parse(url)?;
        if base.cannot_be_a_base() {
            return Err(format!("entitlement API URL cannot be a base: {url}").into());
        }
        Ok(Self { base })
    }

    fn resource(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(
        &self,
        ticket: &Ticket,
        method: &str,
        url: &Url,
    ) -> Result<(u16, String), Box<dyn std::error::Error + Send + Sync>> {
        let output = Command::new("curl")
            .args(["--silent", "--show-error", "--negotiate", "--user", ":"])
            .args(["--request", method, "--write-out", "\n%{http_code}"])
            .arg(url.as_str())
            .env("KRB5CCNAME", &ticket.cache)
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{method} {url} failed: {}", stderr.trim()).into());
        }
        parse_response(&String::from_utf8_lossy(&output.stdout))
    }

    fn mutate(
        &self,
        ticket: &Ticket,
        method: &str,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = self.resource(&[user, entitlement]);
        let (status, _) = self.request(ticket, method, &url)?;
        if is_success(status) {
            Ok(())
        } else {
            Err(format!("{method} {url} answered {status}").into())
        }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Splits curl output into body and the status code written after it.
fn parse_response(stdout: &str) -> Result<(u16, String), Box<dyn std::error::Error + Send + Sync>> {
    let (body, code) = stdout.rsplit_once('\n').ok_or("curl did not report a status code")?;
    let status = code.trim().parse::<u16>().map_err(|e| format!("bad status code {code:?}: {e}"))?;
    Ok((status, body.to_string()))
}

impl EntitlementService for LiveEntitlementService {
    fn grant(
        &self,
        ticket: &Ticket,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.mutate(ticket, "PUT", user, entitlement)
    }

    fn revoke(
        &self,
        ticket: &Ticket,
        user: &str,
        entitlement: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.mutate(ticket, "DELETE", user, entitlement)
    }

    fn list(
        &self,
        ticket: &Ticket,
        user: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let url = self.resource(&[user]);
        let (status, body) = self.request(ticket, "GET", &url)?;
        if !is_success(status) {
            return Err(format!("GET {url} answered {status}").into());
        }
        let parsed: UserEntitlements = serde_json::from_str(&body)?;
        Ok(parsed.entitlements)
    }
}
