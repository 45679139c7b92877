//! The reconciliation engine.
//!
//! For every entitlement, in lexicographic order, the engine compares the
//! users the directory says hold it with the users its definitions say should
//! hold it, then grants and revokes the difference. Failures are collected and
//! never stop the run.

pub mod failures;

use std::fmt;

use tracing::{debug, info, warn};

use crate::directory::DirectoryClient;
use crate::entitlement::EntitlementSession;
use crate::error::{Error, Result};
use crate::mapping::{EditSession, Mappings};
use crate::resolve::{Definition, MembershipSet, ResolverRegistry};

pub use failures::{FailureCollector, FailureRecord};

/// A grant or revoke applied to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    /// Grant to a user.
    Add,
    /// Revoke from a user.
    Remove,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Operation::from(*self))
    }
}

/// Step of a run that can fail, as named in a [`FailureRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Grant to a user.
    Add,
    /// Revoke from a user.
    Remove,
    /// Compute current or expected membership.
    Resolve,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Resolve => "resolve",
        })
    }
}

impl From<Change> for Operation {
    fn from(change: Change) -> Self {
        match change {
            Change::Add => Self::Add,
            Change::Remove => Self::Remove,
        }
    }
}

/// Which side of the difference a run applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Grants and revokes.
    #[default]
    Both,
    /// Grants only; revocations are reported.
    OnlyAdd,
    /// Revokes only; grants are reported.
    OnlyRemove,
}

impl Direction {
    /// Builds a direction from the two mutually exclusive flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if both flags are set.
    pub fn from_flags(only_add: bool, only_remove: bool) -> Result<Self> {
        match (only_add, only_remove) {
            (true, true) => {
                Err(Error::Config("only-add and only-remove are mutually exclusive".into()))
            }
            (true, false) => Ok(Self::OnlyAdd),
            (false, true) => Ok(Self::OnlyRemove),
            (false, false) => Ok(Self::Both),
        }
    }

    /// Returns `true` if this direction applies `change`.
    #[must_use]
    pub fn allows(self, change: Change) -> bool {
        match change {
            Change::Add => self != Self::OnlyRemove,
            Change::Remove => self != Self::OnlyAdd,
        }
    }
}

/// How a run treats the differences it finds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    /// Compute and report without mutating anything.
    pub dry_run: bool,
    /// Which differences are applied.
    pub direction: Direction,
}

/// Users to grant and to revoke for one entitlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Expected but not current.
    pub to_add: MembershipSet,
    /// Current but not expected.
    pub to_remove: MembershipSet,
}

impl Delta {
    /// Computes `expected - current` and `current - expected`.
    #[must_use]
    pub fn between(current: &MembershipSet, expected: &MembershipSet) -> Self {
        Self {
            to_add: expected.difference(current).cloned().collect(),
            to_remove: current.difference(expected).cloned().collect(),
        }
    }

    /// Returns `true` if membership already matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Progress of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Nothing started.
    Idle,
    /// Mappings accepted, no entitlement processed yet.
    Loaded,
    /// Working on the named entitlement.
    Reconciling(String),
    /// Finished without failures.
    Done,
    /// Finished with at least one failure.
    Failed,
}

/// Result of reconciling one entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Entitlement name.
    pub entitlement: String,
    /// Differences found, whether or not they were applied.
    pub delta: Delta,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// One entry per entitlement whose membership could be computed.
    pub outcomes: Vec<Outcome>,
    /// Every failed operation.
    pub failures: FailureCollector,
    /// Final state, [`RunState::Done`] or [`RunState::Failed`].
    pub state: RunState,
}

impl Report {
    /// Turns a report with failures into [`Error::OperationsFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationsFailed`] if anything failed.
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::OperationsFailed(self.failures.len()))
        }
    }
}

/// Drives reconciliation of a set of mappings.
pub struct Reconciler<'a> {
    directory: &'a DirectoryClient<'a>,
    resolvers: &'a ResolverRegistry<'a>,
    mode: RunMode,
    state: RunState,
}

impl<'a> Reconciler<'a> {
    /// Creates an idle engine.
    #[must_use]
    pub fn new(
        directory: &'a DirectoryClient<'a>,
        resolvers: &'a ResolverRegistry<'a>,
        mode: RunMode,
    ) -> Self {
        Self { directory, resolvers, mode, state: RunState::Idle }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Reconciles every entitlement in `mappings`.
    ///
    /// Mutations go through `session`, which may be `None` only in dry-run
    /// mode. Successful mutations are staged into `mirror` when given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a mutating run has no session. Failures of
    /// individual entitlements and users are collected in the report instead.
    pub fn run(
        &mut self,
        mappings: &Mappings,
        session: Option<&EntitlementSession<'_>>,
        mut mirror: Option<&mut EditSession<'_>>,
    ) -> Result<Report> {
        let session = match (self.mode.dry_run, session) {
            (true, _) => None,
            (false, Some(session)) => Some(session),
            (false, None) => {
                return Err(Error::Config("a credential session is required to apply changes".into()))
            }
        };
        self.state = RunState::Loaded;

        let mut outcomes = Vec::with_capacity(mappings.len());
        let mut failures = FailureCollector::default();
        for (entitlement, definitions) in mappings.iter() {
            self.state = RunState::Reconciling(entitlement.to_string());
            let delta = match self.delta(entitlement, definitions) {
                Ok(delta) => delta,
                Err(e) => {
                    warn!(entitlement, error = %e, "skipping entitlement");
                    failures.record(entitlement, Operation::Resolve, None, e.to_string());
                    continue;
                }
            };
            self.report(entitlement, &delta);

            if let Some(session) = session {
                for (change, users) in
                    [(Change::Add, &delta.to_add), (Change::Remove, &delta.to_remove)]
                {
                    if !self.mode.direction.allows(change) {
                        continue;
                    }
                    for user in users {
                        match apply(session, change, entitlement, user) {
                            Ok(()) => {
                                if let Some(edits) = mirror.as_deref_mut() {
                                    stage(edits, change, entitlement, user);
                                }
                            }
                            Err(cause) => {
                                warn!(
                                    entitlement,
                                    operation = %change,
                                    user = user.as_str(),
                                    %cause,
                                    "operation failed"
                                );
                                failures.record(
                                    entitlement,
                                    change.into(),
                                    Some(user.as_str()),
                                    cause,
                                );
                            }
                        }
                    }
                }
            }
            outcomes.push(Outcome { entitlement: entitlement.to_string(), delta });
        }

        self.state = if failures.is_empty() { RunState::Done } else { RunState::Failed };
        Ok(Report { outcomes, failures, state: self.state.clone() })
    }

    fn delta(&self, entitlement: &str, definitions: &[Definition]) -> Result<Delta> {
        let current = self.directory.entitled_users(entitlement)?;
        let expected = self.resolvers.expected(definitions)?;
        debug!(entitlement, current = current.len(), expected = expected.len(), "membership");
        Ok(Delta::between(&current, &expected))
    }

    fn report(&self, entitlement: &str, delta: &Delta) {
        let adds = delta.to_add.len();
        let removes = delta.to_remove.len();
        match self.mode.direction {
            Direction::Both => info!(entitlement, "{adds} to add, {removes} to remove"),
            Direction::OnlyAdd => info!(entitlement, "{adds} to add, {removes} can be removed"),
            Direction::OnlyRemove => {
                info!(entitlement, "{adds} can be added, {removes} to remove");
            }
        }
        for user in &delta.to_add {
            debug!(entitlement, user = user.as_str(), "+");
        }
        for user in &delta.to_remove {
            debug!(entitlement, user = user.as_str(), "-");
        }
    }
}

// Mutation errors are reduced to their cause; the record already names the
// entitlement, operation and user.
fn apply(
    session: &EntitlementSession<'_>,
    change: Change,
    entitlement: &str,
    user: &str,
) -> std::result::Result<(), String> {
    session.apply(change, entitlement, user).map_err(|e| match e {
        Error::Mutation { cause, .. } => cause,
        other => other.to_string(),
    })
}

fn stage(edits: &mut EditSession<'_>, change: Change, entitlement: &str, user: &str) {
    match change {
        Change::Add => edits.add(entitlement, user),
        Change::Remove => edits.remove(entitlement, user),
    }
}
