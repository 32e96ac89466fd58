//! Configuration for the Stuntman command-line tool
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (STUNTMAN_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values
//!
//! The library itself is configured in code; this file only describes how
//! the binary assembles a [`PersonaRegistry`].

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::persona::{
    HttpRetriever, Persona, PersonaRegistry, PersonaRetriever, PickerAlignment,
    DEFAULT_NAME_CLAIM_TYPE, DEFAULT_ROLE_CLAIM_TYPE, DEFAULT_ROOT_PATH,
};

/// File name searched for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "stuntman.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StuntmanConfig {
    /// Registry policy
    pub stuntman: StuntmanSettings,

    /// Persona files and peer servers
    pub sources: SourceSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Personas declared inline
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<PersonaEntry>,
}

/// Registry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StuntmanSettings {
    /// Path the endpoints are mounted under
    pub root_path: String,

    pub allow_cookie_auth: bool,

    pub allow_bearer_auth: bool,

    /// Unknown bearer tokens defer to other mechanisms instead of a 403
    pub allow_bearer_passthrough: bool,

    /// Serve the persona list at `{root_path}server`
    pub server_enabled: bool,

    pub picker_alignment: PickerAlignment,

    /// Timeout for each file URL or peer fetch, in seconds
    pub fetch_timeout_secs: u64,
}

/// Where personas are imported from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Absolute paths or URLs of persona JSON documents
    pub files: Vec<String>,

    /// Peer base URLs; failures are logged and skipped
    pub servers: Vec<String>,

    /// Peer base URLs that must load
    pub required_servers: Vec<String>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

/// A persona declared in `[[personas]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaEntry {
    /// Random UUID when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_claim_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_claim_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimEntry {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

// Default implementations

impl Default for StuntmanSettings {
    fn default() -> Self {
        Self {
            root_path: DEFAULT_ROOT_PATH.to_string(),
            allow_cookie_auth: true,
            allow_bearer_auth: true,
            allow_bearer_passthrough: false,
            server_enabled: false,
            picker_alignment: PickerAlignment::Left,
            fetch_timeout_secs: 30,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl PersonaEntry {
    /// Build the persona this entry describes.
    pub fn to_persona(&self) -> Result<Persona> {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut persona = Persona::with_claim_types(
            id,
            self.name.as_str(),
            self.name_claim_type.as_deref().unwrap_or(DEFAULT_NAME_CLAIM_TYPE),
            self.role_claim_type.as_deref().unwrap_or(DEFAULT_ROLE_CLAIM_TYPE),
        )?;

        if let Some(token) = &self.access_token {
            persona.set_access_token(token.as_str())?;
        }
        if let Some(description) = &self.description {
            persona.set_description(description.as_str())?;
        }
        for role in &self.roles {
            persona.add_role(role.as_str())?;
        }
        for claim in &self.claims {
            persona.add_claim(claim.claim_type.as_str(), claim.value.as_str())?;
        }

        Ok(persona)
    }
}

impl StuntmanConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = match Self::find_config_file(config_path)? {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                let config = Self::from_file(&path)?;
                info!(path = %path.display(), "Configuration loaded from file");
                config
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML file without overrides or validation
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        for path in search_paths() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply `STUNTMAN_*` overrides read through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).map(|v| parse_bool(&v));

        if let Some(val) = lookup("STUNTMAN_ROOT_PATH") {
            self.stuntman.root_path = val;
        }
        if let Some(val) = flag("STUNTMAN_ALLOW_COOKIE_AUTH") {
            self.stuntman.allow_cookie_auth = val;
        }
        if let Some(val) = flag("STUNTMAN_ALLOW_BEARER_AUTH") {
            self.stuntman.allow_bearer_auth = val;
        }
        if let Some(val) = flag("STUNTMAN_ALLOW_BEARER_PASSTHROUGH") {
            self.stuntman.allow_bearer_passthrough = val;
        }
        if let Some(val) = flag("STUNTMAN_SERVER_ENABLED") {
            self.stuntman.server_enabled = val;
        }
        if let Some(val) = lookup("STUNTMAN_PICKER_ALIGNMENT") {
            if let Ok(alignment) = val.parse() {
                self.stuntman.picker_alignment = alignment;
            }
        }
        if let Some(val) = lookup("STUNTMAN_FETCH_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.stuntman.fetch_timeout_secs = n;
            }
        }

        // Sources are comma separated and replace the file's lists
        if let Some(val) = lookup("STUNTMAN_FILES") {
            self.sources.files = split_list(&val);
        }
        if let Some(val) = lookup("STUNTMAN_SERVERS") {
            self.sources.servers = split_list(&val);
        }

        if let Some(val) = lookup("STUNTMAN_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("STUNTMAN_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Some(val) = flag("STUNTMAN_LOG_JSON") {
            self.logging.json_format = val;
        }
    }

    /// Expand ~ and environment variables in local paths
    fn expand_paths(&mut self) {
        for file in &mut self.sources.files {
            if !file.contains("://") {
                *file = expand_path(file);
            }
        }

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stuntman.root_path.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "stuntman.root_path",
                "root_path cannot be empty",
            ));
        }

        if self.stuntman.fetch_timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "stuntman.fetch_timeout_secs",
                "fetch_timeout_secs must be greater than 0",
            ));
        }

        if crate::logging::parse_level(&self.logging.level).is_none() {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            ));
        }

        for (index, entry) in self.personas.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(Error::config_field_invalid(
                    format!("personas[{}].name", index),
                    "persona name cannot be empty",
                ));
            }
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.stuntman.fetch_timeout_secs)
    }

    /// Build a registry using the default HTTP retriever
    pub fn build_registry(&self) -> Result<PersonaRegistry> {
        let retriever = Arc::new(HttpRetriever::new(self.fetch_timeout()));
        self.build_registry_with(retriever)
    }

    /// Build a registry: inline personas, then files, then required servers,
    /// then optional servers.
    pub fn build_registry_with(
        &self,
        retriever: Arc<dyn PersonaRetriever>,
    ) -> Result<PersonaRegistry> {
        let settings = &self.stuntman;
        let mut registry = PersonaRegistry::new(&settings.root_path).with_retriever(retriever);

        registry
            .set_allow_cookie_auth(settings.allow_cookie_auth)
            .set_allow_bearer_auth(settings.allow_bearer_auth)
            .set_allow_bearer_passthrough(settings.allow_bearer_passthrough)
            .set_picker_alignment(settings.picker_alignment);
        if settings.server_enabled {
            registry.enable_server();
        }

        for entry in &self.personas {
            registry.add_persona(entry.to_persona()?)?;
        }
        for file in &self.sources.files {
            registry.add_personas_from_json(file)?;
        }
        for server in &self.sources.required_servers {
            registry.add_configuration_from_server(server)?;
        }
        for server in &self.sources.servers {
            registry.try_add_configuration_from_server(server);
        }

        Ok(registry)
    }
}

/// Standard configuration file locations, in search order
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("stuntman").join("config.toml"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".stuntman.toml"));
    }
    paths
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));

    if config_path.exists() && !force {
        return Err(Error::ConfigValidation {
            message: format!(
                "Configuration file already exists: {}. Use --force to overwrite.",
                config_path.display()
            ),
            field: None,
        });
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(&config_path, generate_default_config())?;
    info!(path = %config_path.display(), "Configuration file created");
    Ok(config_path)
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# Stuntman configuration

[stuntman]
# Path the sign-in, sign-out and server endpoints are mounted under
root_path = "/stuntman/"

# Allow signing in through the persona picker
allow_cookie_auth = true

# Allow "Authorization: Bearer <token>" with persona access tokens
allow_bearer_auth = true

# Let unknown bearer tokens fall through to other authentication instead of a 403
allow_bearer_passthrough = false

# Serve the persona list to other Stuntman instances
server_enabled = false

# Picker position: left, center, right
picker_alignment = "left"

# Timeout for each file URL or peer fetch, in seconds
fetch_timeout_secs = 30

[sources]
# Absolute paths or URLs of persona JSON documents
files = []

# Peer base URLs whose personas are imported when reachable
servers = []

# Peer base URLs that must be reachable
required_servers = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.stuntman/logs/stuntman.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 100

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false

# Inline personas
# [[personas]]
# id = "user-1"
# name = "User 1"
# access_token = "123"
# roles = ["admin"]
# claims = [{ type = "given_name", value = "John" }]
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StuntmanConfig::default();
        assert_eq!(config.stuntman.root_path, "/stuntman/");
        assert!(config.stuntman.allow_cookie_auth);
        assert!(!config.stuntman.server_enabled);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_template_parses_and_validates() {
        let config = StuntmanConfig::from_toml(&generate_default_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.stuntman.picker_alignment, PickerAlignment::Left);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STUNTMAN_ROOT_PATH", "/fake-auth"),
            ("STUNTMAN_SERVER_ENABLED", "1"),
            ("STUNTMAN_ALLOW_BEARER_PASSTHROUGH", "true"),
            ("STUNTMAN_PICKER_ALIGNMENT", "right"),
            ("STUNTMAN_SERVERS", "http://a:5000, http://b:5000"),
            ("STUNTMAN_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = StuntmanConfig::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.stuntman.root_path, "/fake-auth");
        assert!(config.stuntman.server_enabled);
        assert!(config.stuntman.allow_bearer_passthrough);
        assert_eq!(config.stuntman.picker_alignment, PickerAlignment::Right);
        assert_eq!(config.sources.servers, vec!["http://a:5000", "http://b:5000"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = StuntmanConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { field: Some(ref f), .. } if f == "logging.level"));
    }

    #[test]
    fn test_validation_empty_root_path() {
        let mut config = StuntmanConfig::default();
        config.stuntman.root_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_personas() {
        let config = StuntmanConfig::from_toml(
            r#"
[stuntman]
root_path = "/custom"
server_enabled = true

[[personas]]
id = "user-1"
name = "User 1"
access_token = "123"
roles = ["admin"]
claims = [{ type = "given_name", value = "John" }]

[[personas]]
name = "Anonymous"
"#,
        )
        .unwrap();

        let registry = config
            .build_registry_with(Arc::new(HttpRetriever::default()))
            .unwrap();

        assert_eq!(registry.root_path(), "/custom/");
        assert!(registry.server_enabled());
        assert_eq!(registry.len(), 2);

        let user = registry.persona_by_access_token("123").unwrap();
        assert_eq!(user.id(), "user-1");
        assert_eq!(user.roles().collect::<Vec<_>>(), vec!["admin"]);
        assert_eq!(user.claims().len(), 2);

        let anonymous = registry.personas().nth(1).unwrap();
        assert!(Uuid::parse_str(anonymous.id()).is_ok());
    }

    #[test]
    fn test_malformed_toml() {
        let err = StuntmanConfig::from_toml("[stuntman\nroot_path =").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut config = StuntmanConfig::default();
        config.personas.push(PersonaEntry {
            id: Some("user-1".to_string()),
            name: "User 1".to_string(),
            ..Default::default()
        });

        let text = toml::to_string(&config).unwrap();
        let parsed = StuntmanConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.personas.len(), 1);
        assert_eq!(parsed.stuntman.root_path, config.stuntman.root_path);
    }

    #[test]
    fn test_explicit_missing_file() {
        let err = StuntmanConfig::load(Some("/definitely/not/here/stuntman.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }
}
