//! Request dispatcher for a host application.
//!
//! A host forwards every request to [`Stuntman::handle`]; `Some` means the
//! request hit a Stuntman endpoint and the returned response must be sent
//! as-is. `None` means the host should carry on, usually after calling
//! [`Stuntman::authenticate`] to apply bearer tokens.

use std::fmt;
use std::sync::Arc;

use http::request::Parts;
use http::Response;
use tracing::{debug, warn};

use crate::error::{Error, ErrorCategory, Result};
use crate::persona::PersonaRegistry;

use super::bearer::{AuthOutcome, AuthenticationStrategy, BearerValidator};
use super::picker::{PersonaListRenderer, SelectionRenderer};
use super::request;
use super::server;
use super::session::SessionStrategy;
use super::signin::SignInFlow;
use super::signout::SignOutFlow;

/// Stuntman endpoints under the root path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SignIn,
    SignOut,
    Server,
}

pub struct Stuntman {
    registry: Arc<PersonaRegistry>,
    renderer: Arc<dyn SelectionRenderer>,
    sign_in: SignInFlow,
    bearer: BearerValidator,
}

impl Stuntman {
    pub fn new(registry: Arc<PersonaRegistry>) -> Self {
        Self {
            sign_in: SignInFlow::new(Arc::clone(&registry)),
            bearer: BearerValidator::new(Arc::clone(&registry)),
            renderer: Arc::new(PersonaListRenderer),
            registry,
        }
    }

    /// Replace the persona picker.
    pub fn with_renderer(mut self, renderer: Arc<dyn SelectionRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn registry(&self) -> &Arc<PersonaRegistry> {
        &self.registry
    }

    /// Which endpoint, if any, this request targets.
    ///
    /// Sign-in and sign-out take GET only, and only while cookie auth is
    /// allowed. The server endpoint takes GET and HEAD.
    pub fn route(&self, parts: &Parts) -> Option<Endpoint> {
        let path = parts.uri.path();
        let registry = &self.registry;

        if registry.allow_cookie_auth() && request::is_session_method(&parts.method) {
            if request::path_matches(path, &registry.sign_in_uri()) {
                return Some(Endpoint::SignIn);
            }
            if request::path_matches(path, &registry.sign_out_uri()) {
                return Some(Endpoint::SignOut);
            }
        }

        if request::is_read_method(&parts.method)
            && request::path_matches(path, &registry.server_uri())
        {
            return Some(Endpoint::Server);
        }

        None
    }

    /// Serve a Stuntman endpoint.
    ///
    /// Unknown personas become a 404 response. Configuration errors such as
    /// a missing return URL, and session failures, are returned as `Err`.
    pub async fn handle<S>(&self, parts: &Parts, session: &mut S) -> Result<Option<Response<String>>>
    where
        S: SessionStrategy + ?Sized,
    {
        let Some(endpoint) = self.route(parts) else {
            return Ok(None);
        };
        debug!(endpoint = ?endpoint, path = %parts.uri.path(), "Stuntman endpoint");

        let result = match endpoint {
            Endpoint::SignIn => {
                self.sign_in
                    .handle(parts, session, self.renderer.as_ref())
                    .await
            }
            Endpoint::SignOut => SignOutFlow.handle(parts, session).await,
            Endpoint::Server => server::respond(&self.registry),
        };

        match result {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.category() == ErrorCategory::Authorization => {
                warn!(error = %e.format_for_log(), "Sign-in refused");
                error_response(&e).map(Some)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply bearer authentication to a non-Stuntman request.
    pub fn authenticate(&self, parts: &Parts) -> AuthOutcome {
        self.bearer.authenticate(parts)
    }
}

impl fmt::Debug for Stuntman {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stuntman")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Plain-text response carrying the error's status and message.
pub fn error_response(error: &Error) -> Result<Response<String>> {
    request::text(
        error.status_code(),
        "text/plain; charset=utf-8",
        error.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Request, StatusCode};

    use crate::auth::session::MemorySession;
    use crate::persona::Persona;

    fn stuntman(configure: impl FnOnce(&mut PersonaRegistry)) -> Stuntman {
        let mut registry = PersonaRegistry::default();
        registry
            .add_persona(Persona::new("user-1", "User 1").unwrap())
            .unwrap();
        configure(&mut registry);
        Stuntman::new(registry.into_shared())
    }

    fn get(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_routing() {
        let s = stuntman(|_| {});
        assert_eq!(s.route(&get("/stuntman/sign-in")), Some(Endpoint::SignIn));
        assert_eq!(s.route(&get("/STUNTMAN/Sign-Out/")), Some(Endpoint::SignOut));
        assert_eq!(s.route(&get("/stuntman/server?x=1")), Some(Endpoint::Server));
        assert_eq!(s.route(&get("/stuntman/other")), None);
        assert_eq!(s.route(&get("/")), None);

        let post = Request::builder()
            .method(Method::POST)
            .uri("/stuntman/sign-in")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(s.route(&post), None);
    }

    #[test]
    fn test_head_only_reaches_server() {
        let s = stuntman(|_| {});
        let head = |uri: &str| {
            Request::builder()
                .method(Method::HEAD)
                .uri(uri)
                .body(())
                .unwrap()
                .into_parts()
                .0
        };

        assert_eq!(s.route(&head("/stuntman/sign-in?OverrideUserId=user-1")), None);
        assert_eq!(s.route(&head("/stuntman/sign-out")), None);
        assert_eq!(s.route(&head("/stuntman/server")), Some(Endpoint::Server));
    }

    #[test]
    fn test_cookie_auth_disabled_skips_sign_in() {
        let s = stuntman(|r| {
            r.set_allow_cookie_auth(false);
        });
        assert_eq!(s.route(&get("/stuntman/sign-in")), None);
        assert_eq!(s.route(&get("/stuntman/sign-out")), None);
        assert_eq!(s.route(&get("/stuntman/server")), Some(Endpoint::Server));
    }

    #[tokio::test]
    async fn test_unknown_persona_is_404_response() {
        let s = stuntman(|_| {});
        let mut session = MemorySession::new();

        let response = s
            .handle(&get("/stuntman/sign-in?OverrideUserId=nobody&ReturnUrl=/"), &mut session)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().contains("nobody"));
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_missing_return_url_propagates() {
        let s = stuntman(|_| {});
        let mut session = MemorySession::new();

        let err = s
            .handle(&get("/stuntman/sign-out"), &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingReturnUrl));
    }

    #[tokio::test]
    async fn test_unrouted_request_is_none() {
        let s = stuntman(|_| {});
        let mut session = MemorySession::new();
        let handled = s.handle(&get("/api/values"), &mut session).await.unwrap();
        assert!(handled.is_none());
    }
}
