//! Bearer-token authentication against persona access tokens.

use std::sync::Arc;

use http::header::{HeaderValue, AUTHORIZATION};
use http::request::Parts;
use tracing::{debug, warn};

use crate::error::Error;
use crate::persona::PersonaRegistry;

use super::identity::Identity;

const BEARER_SCHEME: &str = "Bearer";

// ─────────────────────────────────────────────────────────────────
// Strategy seam
// ─────────────────────────────────────────────────────────────────

/// Decision an authentication strategy reaches for one request.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Nothing asserted; the next mechanism decides.
    NoAssertion,
    Authenticated(Identity),
    /// End the request with `error.status_code()`.
    Rejected(Error),
}

impl AuthOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthOutcome::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AuthOutcome::Rejected(_))
    }
}

/// Per-request authentication mechanism.
///
/// Implementations are stateless over the request; hosts may chain several
/// and stop at the first outcome other than [`AuthOutcome::NoAssertion`].
pub trait AuthenticationStrategy: Send + Sync {
    /// Scheme name (e.g. "Bearer")
    fn scheme(&self) -> &'static str;

    fn authenticate(&self, parts: &Parts) -> AuthOutcome;
}

// ─────────────────────────────────────────────────────────────────
// BearerValidator
// ─────────────────────────────────────────────────────────────────

/// Matches `Authorization: Bearer <token>` against persona access tokens.
#[derive(Debug, Clone)]
pub struct BearerValidator {
    registry: Arc<PersonaRegistry>,
}

impl BearerValidator {
    pub fn new(registry: Arc<PersonaRegistry>) -> Self {
        Self { registry }
    }
}

impl AuthenticationStrategy for BearerValidator {
    fn scheme(&self) -> &'static str {
        BEARER_SCHEME
    }

    fn authenticate(&self, parts: &Parts) -> AuthOutcome {
        if !self.registry.allow_bearer_auth() {
            return AuthOutcome::NoAssertion;
        }

        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return AuthOutcome::NoAssertion;
        };

        let token = match bearer_token(header) {
            Ok(Some(token)) => token,
            Ok(None) => return AuthOutcome::NoAssertion,
            Err(e) => {
                warn!(path = %parts.uri.path(), "Rejected malformed Authorization header");
                return AuthOutcome::Rejected(e);
            }
        };

        let Some(persona) = self.registry.persona_by_access_token(token) else {
            if self.registry.allow_bearer_passthrough() {
                debug!("Unknown access token, passing through");
                return AuthOutcome::NoAssertion;
            }
            warn!(path = %parts.uri.path(), "Rejected unknown access token");
            return AuthOutcome::Rejected(Error::UnknownAccessToken {
                token: token.to_string(),
            });
        };

        let identity = Identity::for_persona(persona).with_access_token(token);
        debug!(persona = %persona.id(), "Bearer token accepted");

        if let Some(hook) = self.registry.after_bearer_validate() {
            hook(&identity, parts);
        }

        AuthOutcome::Authenticated(identity)
    }
}

/// Token of a `Bearer` header; `None` for any other scheme.
///
/// The value must split on a single space into exactly two non-empty parts.
fn bearer_token(header: &HeaderValue) -> Result<Option<&str>, Error> {
    let value = header
        .to_str()
        .map_err(|_| Error::MalformedAuthorizationHeader)?;

    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::MalformedAuthorizationHeader);
    };

    if token.is_empty() {
        return Err(Error::MalformedAuthorizationHeader);
    }

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Ok(None);
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::{Request, StatusCode};

    use crate::persona::Persona;

    fn registry(configure: impl FnOnce(&mut PersonaRegistry)) -> Arc<PersonaRegistry> {
        let mut registry = PersonaRegistry::default();
        let mut persona = Persona::new("user-1", "User 1").unwrap();
        persona.set_access_token("123").unwrap();
        registry.add_persona(persona).unwrap();
        configure(&mut registry);
        registry.into_shared()
    }

    fn request(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/values");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_missing_header_makes_no_assertion() {
        let validator = BearerValidator::new(registry(|_| {}));
        assert!(matches!(validator.authenticate(&request(None)), AuthOutcome::NoAssertion));
    }

    #[test]
    fn test_malformed_headers_rejected_with_400() {
        let validator = BearerValidator::new(registry(|_| {}));
        for value in ["Bearer", "Bearer a b", "Bearer ", "Bearer  123"] {
            match validator.authenticate(&request(Some(value))) {
                AuthOutcome::Rejected(e) => {
                    assert_eq!(e.status_code(), StatusCode::BAD_REQUEST, "{:?}", value);
                    assert_eq!(e.to_string(), "Authorization header is not in correct format.");
                }
                other => panic!("{:?} gave {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_known_token_authenticates() {
        let validator = BearerValidator::new(registry(|_| {}));
        let outcome = validator.authenticate(&request(Some("Bearer 123")));

        let identity = outcome.identity().unwrap();
        assert_eq!(identity.name(), Some("User 1"));
        assert_eq!(identity.access_token(), Some("123"));
    }

    #[test]
    fn test_unknown_token_rejected_with_403() {
        let validator = BearerValidator::new(registry(|_| {}));
        match validator.authenticate(&request(Some("Bearer 1234"))) {
            AuthOutcome::Rejected(e) => {
                assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
                assert!(e.to_string().contains("'1234'"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_token_with_passthrough_defers() {
        let validator = BearerValidator::new(registry(|r| {
            r.set_allow_bearer_passthrough(true);
        }));
        let outcome = validator.authenticate(&request(Some("Bearer 1234")));
        assert!(matches!(outcome, AuthOutcome::NoAssertion));
    }

    #[test]
    fn test_other_scheme_defers() {
        let validator = BearerValidator::new(registry(|_| {}));
        let outcome = validator.authenticate(&request(Some("Basic dXNlcjpwYXNz")));
        assert!(matches!(outcome, AuthOutcome::NoAssertion));
    }

    #[test]
    fn test_disabled_bearer_auth_ignores_header() {
        let validator = BearerValidator::new(registry(|r| {
            r.set_allow_bearer_auth(false);
        }));
        let outcome = validator.authenticate(&request(Some("Bearer 1234")));
        assert!(matches!(outcome, AuthOutcome::NoAssertion));
    }

    #[test]
    fn test_hook_sees_identity_only_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let validator = BearerValidator::new(registry(move |r| {
            r.on_bearer_validated(move |identity, parts| {
                assert_eq!(identity.access_token(), Some("123"));
                assert_eq!(parts.uri.path(), "/api/values");
                seen.fetch_add(1, Ordering::SeqCst);
            });
        }));

        validator.authenticate(&request(Some("Bearer 123")));
        validator.authenticate(&request(Some("Bearer nope")));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
