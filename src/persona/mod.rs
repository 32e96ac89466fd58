//! Persona system: fake identities that can be assumed in place of a real login.
//!
//! Personas are collected into a [`PersonaRegistry`] at startup, either
//! declared in code, imported from JSON files and URLs, or fetched from
//! another Stuntman instance running in server mode.

pub mod contract;
pub mod loader;
pub mod registry;
pub mod types;

pub use contract::FederationDocument;
pub use loader::{HttpRetriever, Location, PersonaRetriever, DEFAULT_FETCH_TIMEOUT};
pub use registry::{
    BearerHook, PersonaRegistry, PickerAlignment, AUTHENTICATION_TYPE, DEFAULT_ROOT_PATH,
    SERVER_ENDPOINT, SIGN_IN_ENDPOINT, SIGN_OUT_ENDPOINT,
};
pub use types::{Claim, Persona, DEFAULT_NAME_CLAIM_TYPE, DEFAULT_ROLE_CLAIM_TYPE, LOCAL_SOURCE};
