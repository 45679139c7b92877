//! The entitlement mapping file.
//!
//! [`MappingStore`] loads the file into [`Mappings`] and opens
//! [`EditSession`]s that rewrite it in place, preserving every untouched line.

pub mod edit;
pub mod parse;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::FileSystem;
use crate::resolve::Definition;

pub use edit::{EditKind, EditSession, PendingEdit};

/// Entitlement name to the definitions declaring its expected members.
///
/// Iteration is in lexicographic entitlement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mappings {
    entries: BTreeMap<String, Vec<Definition>>,
}

impl Mappings {
    /// Parses mapping file contents. `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] for a structurally malformed line, an unknown
    /// resolver kind or an invalid query.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let mut entries: BTreeMap<String, Vec<Definition>> = BTreeMap::new();
        for (index, line) in contents.lines().enumerate() {
            let at = |message: String| Error::Mapping {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            };
            let Some(declaration) = parse::parse_line(line).map_err(at)? else {
                continue;
            };
            let definition = Definition::new(&declaration.kind, &declaration.query)
                .map_err(|e| at(e.to_string()))?;
            entries.entry(declaration.entitlement).or_default().push(definition);
        }
        Ok(Self { entries })
    }

    /// Definitions of one entitlement.
    #[must_use]
    pub fn get(&self, entitlement: &str) -> Option<&[Definition]> {
        self.entries.get(entitlement).map(Vec::as_slice)
    }

    /// Iterates over entitlements in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Definition])> {
        self.entries.iter().map(|(name, defs)| (name.as_str(), defs.as_slice()))
    }

    /// Number of entitlements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the file declared nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restricts the mappings to `names`. An empty list selects everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a name is not declared.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        let mut entries = BTreeMap::new();
        for name in names {
            let definitions = self
                .entries
                .get(name)
                .ok_or_else(|| Error::Config(format!("unknown entitlement: {name}")))?;
            entries.insert(name.clone(), definitions.clone());
        }
        Ok(Self { entries })
    }
}

/// Access to the mapping file on disk.
pub struct MappingStore<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
}

impl<'a> MappingStore<'a> {
    /// Creates a store for the file at `path`.
    pub fn new(fs: &'a dyn FileSystem, path: impl Into<PathBuf>) -> Self {
        Self { fs, path: path.into() }
    }

    /// Location of the mapping file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Mapping`]
    /// if it is malformed.
    pub fn load(&self) -> Result<Mappings> {
        let contents = self.read()?;
        let mappings = Mappings::parse(&contents, &self.path)?;
        debug!(path = %self.path.display(), entitlements = mappings.len(), "mapping file loaded");
        Ok(mappings)
    }

    /// Opens an editing session. Nothing is written unless it is committed.
    #[must_use]
    pub fn edit(&self) -> EditSession<'_> {
        EditSession::new(self)
    }

    /// Runs `f` inside an editing session, committing only if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the error of `f` unchanged, leaving the file untouched, or the
    /// error of the commit.
    pub fn edit_with<T>(&self, f: impl FnOnce(&mut EditSession<'_>) -> Result<T>) -> Result<T> {
        let mut session = self.edit();
        let value = f(&mut session)?;
        session.commit()?;
        Ok(value)
    }

    fn read(&self) -> Result<String> {
        self.fs.read_to_string(&self.path).map_err(|e| Error::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn replace(&self, contents: &str) -> Result<()> {
        self.fs.replace(&self.path, contents).map_err(|e| Error::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}
