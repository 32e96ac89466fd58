//! Sign-in endpoint: pick a persona, establish it, redirect back.

use std::sync::Arc;

use http::request::Parts;
use http::{Response, StatusCode};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::persona::PersonaRegistry;

use super::identity::Identity;
use super::picker::{SelectionRenderer, SelectionView};
use super::request::{self, OVERRIDE_QUERY_KEY};
use super::session::SessionStrategy;

/// Where a sign-in request ends up.
#[derive(Debug)]
pub enum SignInOutcome<'a> {
    /// No persona chosen yet; render the picker.
    AwaitingSelection(SelectionView<'a>),
    /// Persona chosen; establish `identity` and redirect.
    Authenticated {
        persona_id: String,
        identity: Identity,
        redirect_to: String,
    },
}

#[derive(Debug, Clone)]
pub struct SignInFlow {
    registry: Arc<PersonaRegistry>,
}

impl SignInFlow {
    pub fn new(registry: Arc<PersonaRegistry>) -> Self {
        Self { registry }
    }

    /// Decide the outcome without touching the session.
    ///
    /// Fails with `UnknownPersona` for an unregistered override id and with
    /// `MissingReturnUrl` when a persona was chosen but there is nowhere to go.
    pub fn evaluate(&self, parts: &Parts) -> Result<SignInOutcome<'_>> {
        let Some(id) = request::query_param(&parts.uri, OVERRIDE_QUERY_KEY) else {
            let return_url = request::return_url_hint(parts);
            debug!(return_url = ?return_url, "Awaiting persona selection");
            return Ok(SignInOutcome::AwaitingSelection(SelectionView::new(
                &self.registry,
                return_url,
            )));
        };

        let persona = self
            .registry
            .persona(&id)
            .ok_or_else(|| Error::UnknownPersona { id: id.clone() })?;

        let redirect_to = request::resolve_return_url(parts)?;

        Ok(SignInOutcome::Authenticated {
            persona_id: id,
            identity: Identity::for_persona(persona),
            redirect_to,
        })
    }

    /// Evaluate and apply: render the picker, or establish the session and redirect.
    pub async fn handle<S>(
        &self,
        parts: &Parts,
        session: &mut S,
        renderer: &dyn SelectionRenderer,
    ) -> Result<Response<String>>
    where
        S: SessionStrategy + ?Sized,
    {
        match self.evaluate(parts)? {
            SignInOutcome::AwaitingSelection(view) => request::text(
                StatusCode::OK,
                "text/html; charset=utf-8",
                renderer.render(&view)?,
            ),
            SignInOutcome::Authenticated {
                persona_id,
                identity,
                redirect_to,
            } => {
                session.establish(identity).await?;
                info!(persona = %persona_id, "Signed in");
                request::redirect(&redirect_to)
            }
        }
    }
}
