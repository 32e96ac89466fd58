//! Sign-out endpoint.

use http::request::Parts;
use http::Response;
use tracing::info;

use crate::error::Result;

use super::request;
use super::session::SessionStrategy;

/// Clears the session and redirects to the resolved return URL.
///
/// The return URL is resolved first, so a request without one leaves the
/// session untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignOutFlow;

impl SignOutFlow {
    pub async fn handle<S>(&self, parts: &Parts, session: &mut S) -> Result<Response<String>>
    where
        S: SessionStrategy + ?Sized,
    {
        let redirect_to = request::resolve_return_url(parts)?;
        session.clear().await?;
        info!("Signed out");
        request::redirect(&redirect_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{LOCATION, REFERER};
    use http::{Request, StatusCode};

    use crate::auth::identity::Identity;
    use crate::auth::session::MemorySession;
    use crate::error::Error;
    use crate::persona::Persona;

    async fn signed_in() -> MemorySession {
        let mut session = MemorySession::new();
        let persona = Persona::new("user-1", "User 1").unwrap();
        session.establish(Identity::for_persona(&persona)).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_clears_and_redirects_to_referer() {
        let parts = Request::builder()
            .uri("/stuntman/sign-out")
            .header(REFERER, "https://app/page")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let mut session = signed_in().await;

        let response = SignOutFlow.handle(&parts, &mut session).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "https://app/page");
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_missing_return_url_is_an_error() {
        let parts = Request::builder()
            .uri("/stuntman/sign-out")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let mut session = signed_in().await;

        let err = SignOutFlow.handle(&parts, &mut session).await.unwrap_err();

        assert!(matches!(err, Error::MissingReturnUrl));
        assert!(session.is_signed_in());
    }
}
