//! Read-only queries against the identity directory.

use ldap3::ldap_escape;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ports::Directory;
use crate::resolve::MembershipSet;

/// Directory queries used by reconciliation.
///
/// The entitlement attribute of a directory entry is the ground truth for
/// who currently holds an entitlement.
pub struct DirectoryClient<'a> {
    directory: &'a dyn Directory,
    entitlement_attribute: String,
    entitlement_base: String,
}

impl<'a> DirectoryClient<'a> {
    /// Creates a client over a directory connection.
    #[must_use]
    pub fn new(directory: &'a dyn Directory, settings: &Settings) -> Self {
        Self {
            directory,
            entitlement_attribute: settings.directory.entitlement_attribute.clone(),
            entitlement_base: settings.entitlement_base.clone(),
        }
    }

    /// Opens the directory connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Directory`] if the directory cannot be reached.
    pub fn connect(&self) -> Result<()> {
        self.directory.connect().map_err(|e| Error::Directory(e.to_string()))
    }

    /// Identifiers of every entry matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Directory`] if the search fails.
    pub fn search(&self, filter: &str) -> Result<Vec<String>> {
        self.directory.search(filter).map_err(|e| Error::Directory(format!("search {filter}: {e}")))
    }

    /// Users currently holding `entitlement`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Directory`] if the search fails.
    pub fn entitled_users(&self, entitlement: &str) -> Result<MembershipSet> {
        Ok(self.search(&self.entitlement_filter(entitlement))?.into_iter().collect())
    }

    fn entitlement_filter(&self, entitlement: &str) -> String {
        let qualified = format!("{}{entitlement}", self.entitlement_base);
        format!("({}={})", self.entitlement_attribute, ldap_escape(&qualified))
    }
}
