//! Claims identity issued for a persona.

use serde::{Deserialize, Serialize};

use crate::persona::{Claim, Persona, AUTHENTICATION_TYPE};

/// Claim type carrying the bearer token a request authenticated with.
pub const ACCESS_TOKEN_CLAIM_TYPE: &str = "access_token";

/// The identity handed to the host's session mechanism or attached to a
/// bearer-authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    authentication_type: String,
    name_claim_type: String,
    role_claim_type: String,
    claims: Vec<Claim>,
}

impl Identity {
    /// Name claim (persona name under its name claim type) followed by the persona's claims.
    pub fn for_persona(persona: &Persona) -> Self {
        let mut claims = Vec::with_capacity(persona.claims().len() + 1);
        claims.push(Claim::new(persona.name_claim_type(), persona.name()));
        claims.extend(persona.claims().iter().cloned());

        Self {
            authentication_type: AUTHENTICATION_TYPE.to_string(),
            name_claim_type: persona.name_claim_type().to_string(),
            role_claim_type: persona.role_claim_type().to_string(),
            claims,
        }
    }

    /// Append an `access_token` claim.
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.claims.push(Claim::new(ACCESS_TOKEN_CLAIM_TYPE, token));
        self
    }

    pub fn authentication_type(&self) -> &str {
        &self.authentication_type
    }

    pub fn name_claim_type(&self) -> &str {
        &self.name_claim_type
    }

    pub fn role_claim_type(&self) -> &str {
        &self.role_claim_type
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Value of the first name claim.
    pub fn name(&self) -> Option<&str> {
        self.find_first(&self.name_claim_type)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.find_first(ACCESS_TOKEN_CLAIM_TYPE)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.find_all(&self.role_claim_type)
    }

    pub fn is_in_role(&self, role: &str) -> bool {
        self.has_claim(&self.role_claim_type, role)
    }

    pub fn find_first(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    pub fn find_all<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claims
            .iter()
            .any(|c| c.claim_type == claim_type && c.value == value)
    }
}
