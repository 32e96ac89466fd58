//! Persona registry: the personas and policy flags for one Stuntman instance.
//!
//! The registry is assembled once at startup (local personas, JSON files,
//! peer servers) and then moved into an `Arc` with [`PersonaRegistry::into_shared`].
//! Request handlers only ever see `&PersonaRegistry`, so lookups need no locking.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::request::Parts;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::Identity;
use crate::error::{Error, Result};

use super::contract;
use super::loader::{self, HttpRetriever, PersonaRetriever};
use super::types::{Persona, LOCAL_SOURCE};

// ─────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────

pub const DEFAULT_ROOT_PATH: &str = "/stuntman/";
pub const SIGN_IN_ENDPOINT: &str = "sign-in";
pub const SIGN_OUT_ENDPOINT: &str = "sign-out";
pub const SERVER_ENDPOINT: &str = "server";

/// Authentication type recorded on every identity Stuntman issues.
pub const AUTHENTICATION_TYPE: &str = "StuntmanAuthentication";

// ─────────────────────────────────────────────────────────────────
// Picker alignment
// ─────────────────────────────────────────────────────────────────

/// Screen edge the persona picker is pinned to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl PickerAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickerAlignment::Left => "left",
            PickerAlignment::Center => "center",
            PickerAlignment::Right => "right",
        }
    }
}

impl fmt::Display for PickerAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickerAlignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(PickerAlignment::Left),
            "center" | "centre" => Ok(PickerAlignment::Center),
            "right" => Ok(PickerAlignment::Right),
            _ => Err(format!(
                "Unknown picker alignment '{}'. Valid: left, center, right",
                s
            )),
        }
    }
}

/// Observer invoked after a bearer token authenticates a request.
pub type BearerHook = Arc<dyn Fn(&Identity, &Parts) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────

/// Personas plus the policy that governs how they can be assumed.
pub struct PersonaRegistry {
    root_path: String,
    personas: IndexMap<String, Persona>,
    allow_cookie_auth: bool,
    allow_bearer_auth: bool,
    allow_bearer_passthrough: bool,
    server_enabled: bool,
    picker_alignment: PickerAlignment,
    retriever: Arc<dyn PersonaRetriever>,
    after_bearer_validate: Option<BearerHook>,
}

impl PersonaRegistry {
    /// Create an empty registry mounted at `root_path`.
    pub fn new(root_path: &str) -> Self {
        Self {
            root_path: normalize_root_path(root_path),
            personas: IndexMap::new(),
            allow_cookie_auth: true,
            allow_bearer_auth: true,
            allow_bearer_passthrough: false,
            server_enabled: false,
            picker_alignment: PickerAlignment::default(),
            retriever: Arc::new(HttpRetriever::default()),
            after_bearer_validate: None,
        }
    }

    /// Replace how files and URLs are read.
    pub fn with_retriever(mut self, retriever: Arc<dyn PersonaRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    /// Freeze the registry for request handling.
    pub fn into_shared(self) -> Arc<Self> {
        info!(
            personas = self.personas.len(),
            root = %self.root_path,
            server = self.server_enabled,
            "Persona registry sealed"
        );
        Arc::new(self)
    }

    // ─────────────────────────────────────────────────────────────
    // Paths
    // ─────────────────────────────────────────────────────────────

    /// Root path; always starts and ends with a single `/`.
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn sign_in_uri(&self) -> String {
        format!("{}{}", self.root_path, SIGN_IN_ENDPOINT)
    }

    pub fn sign_out_uri(&self) -> String {
        format!("{}{}", self.root_path, SIGN_OUT_ENDPOINT)
    }

    pub fn server_uri(&self) -> String {
        format!("{}{}", self.root_path, SERVER_ENDPOINT)
    }

    // ─────────────────────────────────────────────────────────────
    // Policy
    // ─────────────────────────────────────────────────────────────

    pub fn allow_cookie_auth(&self) -> bool {
        self.allow_cookie_auth
    }

    pub fn allow_bearer_auth(&self) -> bool {
        self.allow_bearer_auth
    }

    pub fn allow_bearer_passthrough(&self) -> bool {
        self.allow_bearer_passthrough
    }

    pub fn server_enabled(&self) -> bool {
        self.server_enabled
    }

    pub fn picker_alignment(&self) -> PickerAlignment {
        self.picker_alignment
    }

    pub fn after_bearer_validate(&self) -> Option<&BearerHook> {
        self.after_bearer_validate.as_ref()
    }

    pub fn set_allow_cookie_auth(&mut self, allow: bool) -> &mut Self {
        self.allow_cookie_auth = allow;
        self
    }

    pub fn set_allow_bearer_auth(&mut self, allow: bool) -> &mut Self {
        self.allow_bearer_auth = allow;
        self
    }

    /// When set, an unmatched bearer token defers to other mechanisms instead of a 403.
    pub fn set_allow_bearer_passthrough(&mut self, allow: bool) -> &mut Self {
        self.allow_bearer_passthrough = allow;
        self
    }

    /// Serve the persona list at `{root}server`. The endpoint is unauthenticated.
    pub fn enable_server(&mut self) -> &mut Self {
        self.server_enabled = true;
        self
    }

    pub fn set_picker_alignment(&mut self, alignment: PickerAlignment) -> &mut Self {
        self.picker_alignment = alignment;
        self
    }

    /// Observe bearer-authenticated requests. Has no effect on the outcome.
    pub fn on_bearer_validated<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Identity, &Parts) + Send + Sync + 'static,
    {
        self.after_bearer_validate = Some(Arc::new(hook));
        self
    }

    // ─────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────

    /// Personas in the order they were added.
    pub fn personas(&self) -> impl ExactSizeIterator<Item = &Persona> {
        self.personas.values()
    }

    pub fn persona(&self, id: &str) -> Option<&Persona> {
        self.personas.get(id)
    }

    /// First persona (in insertion order) holding exactly this access token.
    pub fn persona_by_access_token(&self, token: &str) -> Option<&Persona> {
        self.personas
            .values()
            .find(|p| p.access_token() == Some(token))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.personas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// Persona list in the federation JSON contract.
    pub fn to_federation_json(&self) -> Result<String> {
        contract::to_json(self.personas.values())
    }

    // ─────────────────────────────────────────────────────────────
    // Adding personas
    // ─────────────────────────────────────────────────────────────

    /// Add a persona defined in code. Its source becomes `local`.
    pub fn add_persona(&mut self, persona: Persona) -> Result<&mut Self> {
        self.insert(persona, LOCAL_SOURCE)?;
        Ok(self)
    }

    /// Add personas in order, stopping at the first failure.
    ///
    /// Personas before the failing one stay registered.
    pub fn add_personas<I>(&mut self, personas: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Persona>,
    {
        for persona in personas {
            self.insert(persona, LOCAL_SOURCE)?;
        }
        Ok(self)
    }

    /// Add personas from a JSON file path or URL.
    pub fn add_personas_from_json(&mut self, path_or_url: &str) -> Result<&mut Self> {
        self.add_personas_from_json_with(path_or_url, |_| Ok(()))
    }

    /// Add personas from a JSON file path or URL, letting `configure` adjust each
    /// one (for example to add claims) before it is registered.
    pub fn add_personas_from_json_with<F>(
        &mut self,
        path_or_url: &str,
        mut configure: F,
    ) -> Result<&mut Self>
    where
        F: FnMut(&mut Persona) -> Result<()>,
    {
        let personas = loader::load_persona_document(self.retriever.as_ref(), path_or_url)?;

        for mut persona in personas {
            configure(&mut persona)?;
            self.insert(persona, path_or_url)?;
        }

        Ok(self)
    }

    /// Add every persona served by another Stuntman instance at `base_url`.
    ///
    /// Network, parse, and duplicate-id failures are returned and leave the
    /// registry unchanged.
    pub fn add_configuration_from_server(&mut self, base_url: &str) -> Result<&mut Self> {
        let personas = loader::fetch_server_personas(self.retriever.as_ref(), base_url)?;

        let mut seen = std::collections::HashSet::new();
        for persona in &personas {
            if self.contains(persona.id()) || !seen.insert(persona.id()) {
                return Err(Error::DuplicatePersonaId {
                    id: persona.id().to_string(),
                });
            }
        }

        let count = personas.len();
        for persona in personas {
            self.insert(persona, base_url)?;
        }

        info!(server = %base_url, count, "Added configuration from server");
        Ok(self)
    }

    /// Like [`add_configuration_from_server`](Self::add_configuration_from_server) but
    /// never fails; errors are logged and dropped.
    pub fn try_add_configuration_from_server(&mut self, base_url: &str) -> &mut Self {
        self.try_add_configuration_from_server_with(base_url, |_| {})
    }

    /// Like [`add_configuration_from_server`](Self::add_configuration_from_server) but
    /// hands any error to `on_error` instead of returning it.
    pub fn try_add_configuration_from_server_with<F>(
        &mut self,
        base_url: &str,
        on_error: F,
    ) -> &mut Self
    where
        F: FnOnce(Error),
    {
        if let Err(e) = self.add_configuration_from_server(base_url) {
            warn!(server = %base_url, error = %e.format_for_log(), "Skipping server configuration");
            on_error(e);
        }
        self
    }

    fn insert(&mut self, mut persona: Persona, source: &str) -> Result<()> {
        if self.contains(persona.id()) {
            return Err(Error::DuplicatePersonaId {
                id: persona.id().to_string(),
            });
        }

        persona.set_source(source)?;

        if let Some(token) = persona.access_token() {
            if let Some(existing) = self.persona_by_access_token(token) {
                warn!(
                    persona = %persona.id(),
                    shadowed_by = %existing.id(),
                    "Access token already in use; bearer lookups resolve to the earlier persona"
                );
            }
        }

        debug!(persona = %persona.id(), source = %source, "Persona added");
        self.personas.insert(persona.id().to_string(), persona);
        Ok(())
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_PATH)
    }
}

impl fmt::Debug for PersonaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonaRegistry")
            .field("root_path", &self.root_path)
            .field("personas", &self.personas.keys().collect::<Vec<_>>())
            .field("allow_cookie_auth", &self.allow_cookie_auth)
            .field("allow_bearer_auth", &self.allow_bearer_auth)
            .field("allow_bearer_passthrough", &self.allow_bearer_passthrough)
            .field("server_enabled", &self.server_enabled)
            .field("picker_alignment", &self.picker_alignment)
            .field("after_bearer_validate", &self.after_bearer_validate.is_some())
            .finish()
    }
}

/// Normalize to `/segment/.../`: one leading and exactly one trailing slash.
fn normalize_root_path(root_path: &str) -> String {
    let trimmed = root_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
