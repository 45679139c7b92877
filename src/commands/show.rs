//! `entsync show` command.

use std::io::Write;

use super::emit;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::entitlement::EntitlementClient;
use crate::error::Result;

/// Prints every entitlement `user` currently holds, one per line.
///
/// # Errors
///
/// Returns a credential error if no ticket can be obtained, or a resolve
/// error if the entitlement service cannot answer.
pub fn run(
    ctx: &ServiceContext,
    settings: &Settings,
    user: &str,
    out: &mut impl Write,
) -> Result<()> {
    let client =
        EntitlementClient::new(ctx.credentials.as_ref(), ctx.entitlements.as_ref(), settings);
    let session = client.open()?;
    for entitlement in session.get(user)? {
        emit(out, entitlement)?;
    }
    session.close()
}
