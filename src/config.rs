//! Static configuration loaded from a YAML file plus environment overrides.
//!
//! ```yaml
//! entitlement_base: "urn:mace:example.org:entitlement:"
//! mapping_file: entmap.conf
//! directory:
//!   url: ldaps://ldap.example.org
//!   bind_dn: cn=entsync,dc=example,dc=org
//!   base_dn: dc=example,dc=org
//! course_registry:
//!   url: https://registry.example.org/rest
//!   user: entsync
//!   department: 4
//!   realm: EXAMPLE.ORG
//! entitlement_api:
//!   url: https://entitlements.example.org/api/user
//!   principal: entsync/host.example.org@EXAMPLE.ORG
//!   keytab: entsync.keytab
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ENTSYNC_CONFIG";
/// Environment variable overriding the directory bind password.
pub const DIRECTORY_PASSWORD_ENV: &str = "ENTSYNC_DIRECTORY_PASSWORD";
/// Environment variable overriding the course registry password.
pub const REGISTRY_PASSWORD_ENV: &str = "ENTSYNC_REGISTRY_PASSWORD";

const DEFAULT_CONFIG_FILE: &str = "entsync.yaml";

/// Complete runtime configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Prefix turning a short entitlement name into its fully-qualified form.
    pub entitlement_base: String,
    /// Path of the entitlement mapping file.
    pub mapping_file: PathBuf,
    /// Directory connection settings.
    pub directory: DirectorySettings,
    /// Course registry API settings.
    pub course_registry: RegistrySettings,
    /// Entitlement service API settings.
    pub entitlement_api: EntitlementApiSettings,
}

/// Directory connection settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DirectorySettings {
    /// Server URL, e.g. `ldaps://ldap.example.org`.
    pub url: String,
    /// DN used for the simple bind.
    pub bind_dn: String,
    /// Bind password.
    #[serde(default)]
    pub password: String,
    /// Base of every subtree search.
    pub base_dn: String,
    /// Attribute holding the user identifier.
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    /// Attribute holding granted entitlements.
    #[serde(default = "default_entitlement_attribute")]
    pub entitlement_attribute: String,
}

/// Course registry API settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RegistrySettings {
    /// Base URL of the API.
    pub url: String,
    /// Basic auth user.
    pub user: String,
    /// Basic auth password.
    #[serde(default)]
    pub password: String,
    /// Department whose registrations are listed.
    pub department: u32,
    /// Realm usernames are scoped to.
    pub realm: String,
}

/// Entitlement service API settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EntitlementApiSettings {
    /// Base URL of the per-user entitlement resource.
    pub url: String,
    /// Kerberos principal used to acquire the service ticket.
    pub principal: String,
    /// Keytab holding the principal's key.
    pub keytab: PathBuf,
    /// Ticket cache dedicated to this tool.
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
}

fn default_id_attribute() -> String {
    "uid".into()
}

fn default_entitlement_attribute() -> String {
    "eduPersonEntitlement".into()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("ent-cache")
}

impl Settings {
    /// Loads settings from `path`, or from `ENTSYNC_CONFIG`, or from
    /// `entsync.yaml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map_or_else(
            || env::var(CONFIG_ENV).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from),
            Path::to_path_buf,
        );
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut settings = Self::from_yaml(&contents, &base)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Parses settings from YAML, resolving relative paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the YAML is invalid.
    pub fn from_yaml(contents: &str, base: &Path) -> Result<Self> {
        let mut settings: Self = serde_yaml::from_str(contents)
            .map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        settings.mapping_file = resolve(base, &settings.mapping_file);
        settings.entitlement_api.keytab = resolve(base, &settings.entitlement_api.keytab);
        settings.entitlement_api.cache_file = resolve(base, &settings.entitlement_api.cache_file);
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(password) = env::var(DIRECTORY_PASSWORD_ENV) {
            self.directory.password = password;
        }
        if let Ok(password) = env::var(REGISTRY_PASSWORD_ENV) {
            self.course_registry.password = password;
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
