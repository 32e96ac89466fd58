//! Federation endpoint serving the registry to other Stuntman instances.

use http::{Response, StatusCode};
use tracing::debug;

use crate::error::Result;
use crate::persona::PersonaRegistry;

use super::request;

/// `GET {root}server`: the persona list as JSON, or 404 when server mode is off.
pub fn respond(registry: &PersonaRegistry) -> Result<Response<String>> {
    if !registry.server_enabled() {
        return request::text(
            StatusCode::NOT_FOUND,
            "text/plain; charset=utf-8",
            "Stuntman server mode is not enabled.".to_string(),
        );
    }

    let body = registry.to_federation_json()?;
    debug!(personas = registry.len(), "Serving persona list");
    request::text(StatusCode::OK, "application/json", body)
}
