//! `entsync manage` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::{info, warn};

use super::emit;
use crate::cli::ManageArgs;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::entitlement::{EntitlementClient, EntitlementSession};
use crate::error::{Error, Result};
use crate::mapping::{EditSession, MappingStore};
use crate::reconcile::Change;

/// Grants and revokes entitlements for individual users.
///
/// Users come from `args` or, when none are given, from `input`, one per
/// line. For each user every removal is applied before any addition.
/// Successful changes are mirrored into the mapping file unless disabled.
///
/// # Errors
///
/// Returns [`Error::NoActions`] if nothing was requested, a credential error
/// if no ticket can be obtained, or [`Error::OperationsFailed`] if any grant
/// or revoke failed.
pub fn run(
    ctx: &ServiceContext,
    settings: &Settings,
    args: &ManageArgs,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    args.ensure_actions()?;
    let users = if args.users.is_empty() { read_users(input)? } else { args.users.clone() };
    info!(users = users.len(), "managing entitlements");

    let store = MappingStore::new(ctx.fs.as_ref(), &settings.mapping_file);
    let mut edits = (!args.no_mapping_update).then(|| store.edit());
    let client =
        EntitlementClient::new(ctx.credentials.as_ref(), ctx.entitlements.as_ref(), settings);
    let session = client.open()?;

    let mut failed = 0;
    for user in &users {
        let changes = args
            .remove
            .iter()
            .map(|e| (Change::Remove, e))
            .chain(args.add.iter().map(|e| (Change::Add, e)));
        for (change, entitlement) in changes {
            match apply(&session, edits.as_mut(), change, entitlement, user) {
                Ok(()) => {
                    info!(
                        entitlement = entitlement.as_str(),
                        user = user.as_str(),
                        operation = %change,
                        "done"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "operation failed");
                    emit(out, format_args!("Failed: {change} {entitlement} {user}"))?;
                    failed += 1;
                }
            }
        }
    }

    if let Some(edits) = edits {
        edits.commit()?;
    }
    session.close()?;

    if failed > 0 {
        Err(Error::OperationsFailed(failed))
    } else {
        Ok(())
    }
}

fn apply(
    session: &EntitlementSession<'_>,
    edits: Option<&mut EditSession<'_>>,
    change: Change,
    entitlement: &str,
    user: &str,
) -> Result<()> {
    session.apply(change, entitlement, user)?;
    if let Some(edits) = edits {
        match change {
            Change::Add => edits.add(entitlement, user),
            Change::Remove => edits.remove(entitlement, user),
        }
    }
    Ok(())
}

fn read_users(input: impl BufRead) -> Result<Vec<String>> {
    let mut users = Vec::new();
    for line in input.lines() {
        let line = line
            .map_err(|e| Error::Io { path: PathBuf::from("<stdin>"), message: e.to_string() })?;
        let user = line.trim();
        if !user.is_empty() {
            users.push(user.to_string());
        }
    }
    Ok(users)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{
        settings, FakeDirectory, FakeEntitlementService, FakeIssuer, FakeRegistry, FixedClock,
        MemFs,
    };

    const MAPPING: &str = "wiki = user:alice  # staff\nlab  = ldap:(ou=lab)\n";

    struct Harness {
        fs: Arc<MemFs>,
        issuer: Arc<FakeIssuer>,
        service: Arc<FakeEntitlementService>,
        ctx: ServiceContext,
    }

    fn harness(service: FakeEntitlementService) -> Harness {
        harness_with(service, FakeDirectory::default())
    }

    fn harness_with(service: FakeEntitlementService, directory: FakeDirectory) -> Harness {
        let settings = settings();
        let fs = Arc::new(MemFs::default().with_file(&settings.mapping_file, MAPPING));
        let issuer = Arc::new(FakeIssuer::default());
        let service = Arc::new(service);
        let ctx = ServiceContext::from_ports(
            Box::new(FixedClock::ymd(2023, 8, 14)),
            Box::new(Arc::clone(&fs)),
            Box::new(directory),
            Box::new(FakeRegistry::default()),
            Box::new(Arc::clone(&issuer)),
            Box::new(Arc::clone(&service)),
        );
        Harness { fs, issuer, service, ctx }
    }

    fn args(users: &[&str], add: &[&str], remove: &[&str]) -> ManageArgs {
        let owned = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        ManageArgs {
            users: owned(users),
            add: owned(add),
            remove: owned(remove),
            no_mapping_update: false,
        }
    }

    fn mapping(h: &Harness) -> String {
        h.fs.contents(&settings().mapping_file).unwrap()
    }

    #[test]
    fn removals_precede_additions_for_each_user() {
        let h = harness(FakeEntitlementService::default());
        let args = args(&["bob", "carol"], &["wiki"], &["lab"]);
        run(&h.ctx, &settings(), &args, &b""[..], &mut Vec::new()).unwrap();

        assert_eq!(
            h.service.calls(),
            [
                "revoke bob urn:mace:example.org:lab",
                "grant bob urn:mace:example.org:wiki",
                "revoke carol urn:mace:example.org:lab",
                "grant carol urn:mace:example.org:wiki",
            ]
        );
        assert_eq!(h.issuer.destroyed(), 1);
    }

    #[test]
    fn works_while_directory_is_down() {
        let h = harness_with(
            FakeEntitlementService::default(),
            FakeDirectory::default().unreachable("Connection refused"),
        );
        let args = args(&["bob"], &["wiki"], &[]);
        run(&h.ctx, &settings(), &args, &b""[..], &mut Vec::new()).unwrap();

        assert_eq!(h.service.calls(), ["grant bob urn:mace:example.org:wiki"]);
    }

    #[test]
    fn successful_changes_are_mirrored_into_mapping() {
        let h = harness(FakeEntitlementService::default());
        let args = args(&["bob"], &["wiki"], &[]);
        run(&h.ctx, &settings(), &args, &b""[..], &mut Vec::new()).unwrap();

        assert_eq!(
            mapping(&h),
            "wiki = user:alice  # staff\nwiki = user:bob\nlab  = ldap:(ou=lab)\n"
        );
    }

    #[test]
    fn removal_is_mirrored_into_mapping() {
        let h = harness(FakeEntitlementService::default());
        let args = args(&["alice"], &[], &["wiki"]);
        run(&h.ctx, &settings(), &args, &b""[..], &mut Vec::new()).unwrap();

        assert_eq!(mapping(&h), "lab  = ldap:(ou=lab)\n");
    }

    #[test]
    fn mapping_update_can_be_disabled() {
        let h = harness(FakeEntitlementService::default());
        let mut args = args(&["bob"], &["wiki"], &[]);
        args.no_mapping_update = true;
        run(&h.ctx, &settings(), &args, &b""[..], &mut Vec::new()).unwrap();

        assert_eq!(mapping(&h), MAPPING);
        assert_eq!(h.fs.writes(), 0);
    }

    #[test]
    fn users_are_read_from_input_when_not_given() {
        let h = harness(FakeEntitlementService::default());
        let args = args(&[], &["wiki"], &[]);
        run(&h.ctx, &settings(), &args, &b"bob\n\n  carol  \n"[..], &mut Vec::new()).unwrap();

        assert_eq!(
            h.service.calls(),
            ["grant bob urn:mace:example.org:wiki", "grant carol urn:mace:example.org:wiki"]
        );
    }

    #[test]
    fn failures_are_reported_and_not_mirrored() {
        let h = harness(FakeEntitlementService::default().rejecting("mallory"));
        let args = args(&["mallory", "bob"], &["wiki"], &[]);
        let mut out = Vec::new();
        let err = run(&h.ctx, &settings(), &args, &b""[..], &mut out).unwrap_err();

        assert!(matches!(err, Error::OperationsFailed(1)));
        assert_eq!(String::from_utf8(out).unwrap(), "Failed: add wiki mallory\n");
        assert!(!mapping(&h).contains("mallory"));
        assert!(mapping(&h).contains("wiki = user:bob\n"));
    }

    #[test]
    fn no_actions_fails_before_acquiring_ticket() {
        let h = harness(FakeEntitlementService::default());
        let err = run(&h.ctx, &settings(), &args(&["bob"], &[], &[]), &b""[..], &mut Vec::new())
            .unwrap_err();

        assert!(matches!(err, Error::NoActions));
        assert_eq!(h.issuer.acquired(), 0);
    }
}
