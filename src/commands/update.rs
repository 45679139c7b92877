//! `entsync update` command.

use std::io::Write;

use tracing::info;

use super::emit;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::directory::DirectoryClient;
use crate::entitlement::{EntitlementClient, EntitlementSession};
use crate::error::Result;
use crate::mapping::MappingStore;
use crate::reconcile::{Reconciler, RunMode};
use crate::resolve::ResolverRegistry;

/// Reconciles the named entitlements, or all of them when `names` is empty.
///
/// Each failure is printed as one line to `out` once every entitlement has
/// been processed, even when the ticket cannot be destroyed afterwards. A dry
/// run never acquires a service ticket.
///
/// # Errors
///
/// Returns a configuration, mapping, directory or credential error before
/// anything is changed, or [`crate::Error::OperationsFailed`] if any operation failed.
pub fn run(
    ctx: &ServiceContext,
    settings: &Settings,
    names: &[String],
    mode: RunMode,
    out: &mut impl Write,
) -> Result<()> {
    let store = MappingStore::new(ctx.fs.as_ref(), &settings.mapping_file);
    let mappings = store.load()?.select(names)?;
    info!(entitlements = mappings.len(), dry_run = mode.dry_run, "reconciling");

    let directory = DirectoryClient::new(ctx.directory.as_ref(), settings);
    directory.connect()?;
    let resolvers = ResolverRegistry::new(
        &directory,
        ctx.registry.as_ref(),
        ctx.clock.as_ref(),
        &settings.course_registry.realm,
    );
    let client =
        EntitlementClient::new(ctx.credentials.as_ref(), ctx.entitlements.as_ref(), settings);
    let session = if mode.dry_run { None } else { Some(client.open()?) };

    let mut engine = Reconciler::new(&directory, &resolvers, mode);
    let report = engine.run(&mappings, session.as_ref(), None)?;
    let closed = session.map_or(Ok(()), EntitlementSession::close);

    for failure in &report.failures {
        emit(out, failure)?;
    }
    closed?;
    report.into_result()
}
