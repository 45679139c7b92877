//! Live directory adapter speaking LDAP through `ldap3`.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use ldap3::{LdapConn, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, warn};

use crate::config::DirectorySettings;
use crate::ports::directory::Directory;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

enum Connection {
    Pending,
    Bound(LdapConn),
    Failed(String),
}

/// Read-only LDAP connection, bound by `connect` or the first search.
///
/// Commands that never search never touch the server. A failed connect is
/// remembered and reported by every later search.
pub struct LiveDirectory {
    settings: DirectorySettings,
    conn: Mutex<Connection>,
}

impl LiveDirectory {
    /// Prepares a connection without contacting the server.
    #[must_use]
    pub fn new(settings: &DirectorySettings) -> Self {
        Self { settings: settings.clone(), conn: Mutex::new(Connection::Pending) }
    }

    fn bind(&self) -> Result<LdapConn, Box<dyn std::error::Error + Send + Sync>> {
        debug!(url = %self.settings.url, "connecting to directory");
        let mut conn = LdapConn::with_settings(
            LdapConnSettings::new().set_conn_timeout(CONNECT_TIMEOUT),
            &self.settings.url,
        )?;
        conn.simple_bind(&self.settings.bind_dn, &self.settings.password)?.success()?;
        Ok(conn)
    }

    fn bound(
        &self,
    ) -> Result<MutexGuard<'_, Connection>, Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.conn.lock().map_err(|_| "directory connection lock poisoned")?;
        if let Connection::Pending = *state {
            *state = match self.bind() {
                Ok(conn) => Connection::Bound(conn),
                Err(e) => Connection::Failed(format!("connecting to {}: {e}", self.settings.url)),
            };
        }
        if let Connection::Failed(message) = &*state {
            return Err(message.clone().into());
        }
        Ok(state)
    }
}

impl Directory for LiveDirectory {
    fn connect(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bound().map(drop)
    }

    fn search(&self, filter: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let mut state = self.bound()?;
        let Connection::Bound(conn) = &mut *state else {
            return Err("directory connection not established".into());
        };

        let id_attribute = self.settings.id_attribute.as_str();
        let (entries, _) = conn
            .search(&self.settings.base_dn, Scope::Subtree, filter, vec![id_attribute])?
            .success()?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .filter_map(|entry| entry.attrs.get(id_attribute).and_then(|v| v.first().cloned()))
            .collect())
    }
}

impl Drop for LiveDirectory {
    fn drop(&mut self) {
        if let Ok(Connection::Bound(conn)) = self.conn.get_mut() {
            if let Err(e) = conn.unbind() {
                warn!(error = %e, "error during directory unbind");
            }
        }
    }
}
