//! Stuntman: assume preconfigured fake identities in a web application
//! without a real identity provider.
//!
//! Build a [`PersonaRegistry`] at startup, freeze it with
//! [`PersonaRegistry::into_shared`], and hand it to a [`Stuntman`] pipeline.
//!
//! ```no_run
//! use stuntman::{Persona, PersonaRegistry, Stuntman};
//!
//! # fn main() -> stuntman::Result<()> {
//! let mut registry = PersonaRegistry::default();
//! let mut admin = Persona::new("user-1", "User 1")?;
//! admin.add_role("admin")?.set_access_token("123")?;
//! registry.add_persona(admin)?.enable_server();
//!
//! let stuntman = Stuntman::new(registry.into_shared());
//! # let _ = stuntman;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod persona;

pub use auth::{
    AuthOutcome, AuthenticationStrategy, BearerValidator, Identity, MemorySession,
    PersonaListRenderer, SelectionRenderer, SelectionView, SessionStrategy, Stuntman,
    StuntmanColor,
};
pub use error::{Error, ErrorCategory, ErrorCode, Result};
pub use persona::{Claim, Persona, PersonaRegistry, PersonaRetriever, PickerAlignment};
