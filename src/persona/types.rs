//! Core types for the persona system.
//!
//! A persona is one fake identity: an id, a display name, and an ordered
//! list of claims. Personas are freely mutable while the caller owns them
//! and become read-only once handed to a [`PersonaRegistry`].
//!
//! [`PersonaRegistry`]: super::PersonaRegistry

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Claim type used for the display name unless overridden.
pub const DEFAULT_NAME_CLAIM_TYPE: &str = "name";

/// Claim type used for roles unless overridden.
pub const DEFAULT_ROLE_CLAIM_TYPE: &str = "role";

/// Source recorded for personas added directly in code.
pub const LOCAL_SOURCE: &str = "local";

// ─────────────────────────────────────────────────────────────────
// Claim
// ─────────────────────────────────────────────────────────────────

/// A single (type, value) pair asserted about a persona.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "Type")]
    pub claim_type: String,

    #[serde(rename = "Value")]
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.claim_type, self.value)
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// One fake identity that can be assumed through sign-in or a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", try_from = "PersonaRecord")]
pub struct Persona {
    id: String,
    name: String,
    name_claim_type: String,
    role_claim_type: String,
    claims: Vec<Claim>,

    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl Persona {
    /// Create a persona with the default `name`/`role` claim types.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        Self::with_claim_types(id, name, DEFAULT_NAME_CLAIM_TYPE, DEFAULT_ROLE_CLAIM_TYPE)
    }

    /// Create a persona whose name and role claims use custom claim types.
    pub fn with_claim_types(
        id: impl Into<String>,
        name: impl Into<String>,
        name_claim_type: impl Into<String>,
        role_claim_type: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            id: require_text("id", id.into())?,
            name: require_text("name", name.into())?,
            name_claim_type: require_text("name claim type", name_claim_type.into())?,
            role_claim_type: require_text("role claim type", role_claim_type.into())?,
            claims: Vec::new(),
            access_token: None,
            description: None,
            source: None,
        })
    }

    /// Create a persona with a random UUID id.
    pub fn generated(name: impl Into<String>) -> Result<Self> {
        Self::new(Uuid::new_v4().to_string(), name)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_claim_type(&self) -> &str {
        &self.name_claim_type
    }

    pub fn role_claim_type(&self) -> &str {
        &self.role_claim_type
    }

    /// Claims in insertion order; duplicates are kept.
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Where this persona came from: `local`, a file path, or a URL.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Values of every claim of the role claim type.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == self.role_claim_type)
            .map(|c| c.value.as_str())
    }

    // ─────────────────────────────────────────────────────────────
    // Mutators (only reachable while the caller owns the persona)
    // ─────────────────────────────────────────────────────────────

    pub fn add_claim(
        &mut self,
        claim_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self> {
        let claim_type = require_text("claim type", claim_type.into())?;
        let value = require_text("claim value", value.into())?;
        self.claims.push(Claim { claim_type, value });
        Ok(self)
    }

    /// Add an extra claim of the name claim type.
    pub fn add_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let claim_type = self.name_claim_type.clone();
        self.add_claim(claim_type, name)
    }

    /// Add a claim of the role claim type.
    pub fn add_role(&mut self, role: impl Into<String>) -> Result<&mut Self> {
        let claim_type = self.role_claim_type.clone();
        self.add_claim(claim_type, role)
    }

    pub fn set_access_token(&mut self, access_token: impl Into<String>) -> Result<&mut Self> {
        self.access_token = Some(require_text("access token", access_token.into())?);
        Ok(self)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<&mut Self> {
        self.description = Some(require_text("description", description.into())?);
        Ok(self)
    }

    pub fn set_source(&mut self, source: impl Into<String>) -> Result<&mut Self> {
        self.source = Some(require_text("source", source.into())?);
        Ok(self)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

fn require_text(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::invalid_persona(
            field,
            "must not be empty or whitespace",
        ));
    }
    Ok(value)
}

// ─────────────────────────────────────────────────────────────────
// Wire record
// ─────────────────────────────────────────────────────────────────

/// Persona as it appears in federation JSON, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PersonaRecord {
    id: String,
    name: String,
    name_claim_type: Option<String>,
    role_claim_type: Option<String>,
    claims: Option<Vec<Claim>>,
    access_token: Option<String>,
    description: Option<String>,
    source: Option<String>,
}

impl TryFrom<PersonaRecord> for Persona {
    type Error = Error;

    fn try_from(record: PersonaRecord) -> Result<Self> {
        let mut persona = Persona::with_claim_types(
            record.id,
            record.name,
            record
                .name_claim_type
                .unwrap_or_else(|| DEFAULT_NAME_CLAIM_TYPE.to_string()),
            record
                .role_claim_type
                .unwrap_or_else(|| DEFAULT_ROLE_CLAIM_TYPE.to_string()),
        )?;

        persona.claims = record.claims.unwrap_or_default();
        persona.access_token = non_blank(record.access_token);
        persona.description = non_blank(record.description);
        persona.source = non_blank(record.source);

        Ok(persona)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
