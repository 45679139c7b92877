//! Staged, format-preserving edits of the mapping file.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use super::parse::{format_user_line, parse_line, Declaration};
use super::MappingStore;
use crate::error::Result;
use crate::resolve::ResolverKind;

/// Direction of a staged edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Declare the user statically.
    Add,
    /// Drop the user's static declaration.
    Remove,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// A staged change to one static-user declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    /// Entitlement the declaration belongs to.
    pub entitlement: String,
    /// Whether the user is added or removed.
    pub kind: EditKind,
    /// User being declared.
    pub user: String,
}

/// An open editing session on a [`MappingStore`].
///
/// Edits are staged in memory and written by [`EditSession::commit`] as one
/// atomic replace. Dropping the session without committing discards them.
pub struct EditSession<'a> {
    store: &'a MappingStore<'a>,
    edits: Vec<PendingEdit>,
}

impl<'a> EditSession<'a> {
    pub(super) fn new(store: &'a MappingStore<'a>) -> Self {
        Self { store, edits: Vec::new() }
    }

    /// Stages a `user:` declaration of `user` for `entitlement`.
    pub fn add(&mut self, entitlement: &str, user: &str) {
        self.stage(entitlement, EditKind::Add, user);
    }

    /// Stages removal of the static declaration of `user` for `entitlement`.
    pub fn remove(&mut self, entitlement: &str, user: &str) {
        self.stage(entitlement, EditKind::Remove, user);
    }

    /// Edits staged so far, in staging order.
    #[must_use]
    pub fn pending(&self) -> &[PendingEdit] {
        &self.edits
    }

    /// Returns `true` if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Writes the staged edits.
    ///
    /// The file is re-read and rewritten in a single replace. When the
    /// rewrite leaves the contents unchanged nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read or replaced.
    pub fn commit(self) -> Result<()> {
        if self.edits.is_empty() {
            debug!("no mapping edits staged");
            return Ok(());
        }
        let original = self.store.read()?;
        let updated = rewrite(&original, &self.edits);
        if updated == original {
            debug!("mapping edits already reflected in file");
            return Ok(());
        }
        self.store.replace(&updated)?;
        debug!(
            path = %self.store.path().display(),
            edits = self.edits.len(),
            "mapping file updated"
        );
        Ok(())
    }

    // A later edit of the same (entitlement, user) supersedes an earlier one.
    fn stage(&mut self, entitlement: &str, kind: EditKind, user: &str) {
        self.edits.retain(|e| e.entitlement != entitlement || e.user != user);
        self.edits.push(PendingEdit {
            entitlement: entitlement.to_string(),
            kind,
            user: user.to_string(),
        });
    }
}

fn static_user(declaration: &Declaration) -> Option<(&str, &str)> {
    (ResolverKind::from_tag(&declaration.kind) == Some(ResolverKind::StaticUser))
        .then_some((declaration.entitlement.as_str(), declaration.query.as_str()))
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Applies `edits` to the mapping file text `original`.
///
/// Lines that no edit targets are copied byte for byte. Removed static-user
/// lines disappear. Added users are inserted after the last remaining line of
/// their entitlement, or appended at the end for entitlements the file does
/// not declare, with the name padded to the widest name in the file.
#[must_use]
pub fn rewrite(original: &str, edits: &[PendingEdit]) -> String {
    let lines: Vec<(&str, Option<Declaration>)> = original
        .split_inclusive('\n')
        .map(|raw| (raw, parse_line(raw).ok().flatten()))
        .collect();

    let width = lines
        .iter()
        .filter_map(|(_, declaration)| declaration.as_ref())
        .map(|d| d.entitlement.len())
        .max()
        .unwrap_or(0);

    let removals: HashSet<(&str, &str)> = edits
        .iter()
        .filter(|e| e.kind == EditKind::Remove)
        .map(|e| (e.entitlement.as_str(), e.user.as_str()))
        .collect();

    let kept: Vec<&(&str, Option<Declaration>)> = lines
        .iter()
        .filter(|(_, declaration)| {
            declaration
                .as_ref()
                .and_then(static_user)
                .map_or(true, |key| !removals.contains(&key))
        })
        .collect();

    let declared: HashSet<(&str, &str)> = kept
        .iter()
        .filter_map(|(_, declaration)| declaration.as_ref().and_then(static_user))
        .collect();

    let mut additions: Vec<(&str, Vec<&str>)> = Vec::new();
    for edit in edits.iter().filter(|e| e.kind == EditKind::Add) {
        if declared.contains(&(edit.entitlement.as_str(), edit.user.as_str())) {
            continue;
        }
        match additions.iter_mut().find(|(name, _)| *name == edit.entitlement) {
            Some((_, users)) => {
                if !users.contains(&edit.user.as_str()) {
                    users.push(edit.user.as_str());
                }
            }
            None => additions.push((edit.entitlement.as_str(), vec![edit.user.as_str()])),
        }
    }

    let anchors: HashMap<&str, usize> = kept
        .iter()
        .enumerate()
        .filter_map(|(index, (_, declaration))| {
            declaration.as_ref().map(|d| (d.entitlement.as_str(), index))
        })
        .collect();

    let mut out = String::with_capacity(original.len());
    for (index, (raw, declaration)) in kept.iter().enumerate() {
        out.push_str(raw);
        let Some(declaration) = declaration else { continue };
        if anchors.get(declaration.entitlement.as_str()) != Some(&index) {
            continue;
        }
        if let Some((name, users)) =
            additions.iter().find(|(name, _)| *name == declaration.entitlement)
        {
            ensure_newline(&mut out);
            for user in users {
                out.push_str(&format_user_line(name, user, width));
            }
        }
    }

    for (name, users) in additions.iter().filter(|(name, _)| !anchors.contains_key(name)) {
        ensure_newline(&mut out);
        for user in users {
            out.push_str(&format_user_line(name, user, width));
        }
    }
    out
}
