//! Session seam: how a signed-in identity is persisted between requests.
//!
//! Stuntman never touches cookies itself. The host implements
//! [`SessionStrategy`] on top of whatever session mechanism it already uses
//! and passes one per request into the pipeline.

use async_trait::async_trait;

use crate::error::Result;

use super::identity::Identity;

// ─────────────────────────────────────────────────────────────────
// SessionStrategy Trait
// ─────────────────────────────────────────────────────────────────

/// Host-side session mechanism for cookie-style sign-in.
#[async_trait]
pub trait SessionStrategy: Send {
    /// Persist `identity` as the signed-in user.
    async fn establish(&mut self, identity: Identity) -> Result<()>;

    /// Drop whatever identity is currently established.
    async fn clear(&mut self) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────
// In-memory implementation
// ─────────────────────────────────────────────────────────────────

/// Holds the identity in memory. Useful for tests and single-user tools.
#[derive(Debug, Default, Clone)]
pub struct MemorySession {
    identity: Option<Identity>,
    establish_calls: usize,
    clear_calls: usize,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn establish_calls(&self) -> usize {
        self.establish_calls
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls
    }
}

#[async_trait]
impl SessionStrategy for MemorySession {
    async fn establish(&mut self, identity: Identity) -> Result<()> {
        self.establish_calls += 1;
        self.identity = Some(identity);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.clear_calls += 1;
        self.identity = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;

    #[tokio::test]
    async fn test_memory_session_lifecycle() {
        let persona = Persona::new("user-1", "User 1").unwrap();
        let mut session = MemorySession::new();
        assert!(!session.is_signed_in());

        session.establish(Identity::for_persona(&persona)).await.unwrap();
        assert_eq!(session.identity().and_then(Identity::name), Some("User 1"));

        session.clear().await.unwrap();
        assert!(!session.is_signed_in());
        assert_eq!(session.establish_calls(), 1);
        assert_eq!(session.clear_calls(), 1);
    }
}
