//! Federation JSON contract.
//!
//! The same document is served from `{root}server` and read back by
//! `add_personas_from_json` and `add_configuration_from_server`:
//!
//! ```json
//! { "Users": [ { "Id": "user-1", "Name": "User 1", "Claims": [] } ] }
//! ```
//!
//! Files and URLs may also hold a bare array of persona objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::types::Persona;

/// Owned federation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationDocument {
    #[serde(rename = "Users")]
    pub users: Vec<Persona>,
}

/// Borrowed form used when serving the registry.
#[derive(Debug, Serialize)]
struct FederationView<'a> {
    #[serde(rename = "Users")]
    users: Vec<&'a Persona>,
}

/// Serialize personas to the federation contract.
pub fn to_json<'a>(personas: impl IntoIterator<Item = &'a Persona>) -> Result<String> {
    let view = FederationView {
        users: personas.into_iter().collect(),
    };
    Ok(serde_json::to_string(&view)?)
}

/// Parse a peer's `{root}server` response. Only the wrapped form is accepted.
pub fn parse_server_response(origin: &str, text: &str) -> Result<Vec<Persona>> {
    let document: FederationDocument =
        serde_json::from_str(text).map_err(|e| malformed_json(origin, e))?;
    Ok(document.users)
}

/// Parse a persona file: either the wrapped document or a bare array.
pub fn parse_persona_document(origin: &str, text: &str) -> Result<Vec<Persona>> {
    let value: Value = serde_json::from_str(text).map_err(|e| malformed_json(origin, e))?;

    match value {
        Value::Array(_) => {
            serde_json::from_value::<Vec<Persona>>(value).map_err(|e| malformed_json(origin, e))
        }
        Value::Object(_) => serde_json::from_value::<FederationDocument>(value)
            .map(|d| d.users)
            .map_err(|e| malformed_json(origin, e)),
        other => Err(Error::malformed(
            origin,
            format!(
                "expected an object with \"Users\" or an array, found {}",
                json_kind(&other)
            ),
        )),
    }
}

fn malformed_json(origin: &str, source: serde_json::Error) -> Error {
    Error::MalformedConfiguration {
        origin: origin.to_string(),
        message: source.to_string(),
        source: Some(source),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_parse_wrapped_document() {
        let users = parse_persona_document(
            "test",
            r#"{"Users":[{"Id":"user-1","Name":"User 1"},{"Id":"user-2","Name":"User 2"}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = users.iter().map(Persona::id).collect();
        assert_eq!(ids, vec!["user-1", "user-2"]);
    }

    #[test]
    fn test_parse_bare_array() {
        let users =
            parse_persona_document("test", r#"[{"Id":"user-1","Name":"User 1"}]"#).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name(), "User 1");
    }

    #[test]
    fn test_server_response_requires_wrapper() {
        let err = parse_server_response("peer", r#"[{"Id":"user-1","Name":"User 1"}]"#)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedConfiguration);
    }

    #[test]
    fn test_scalar_document_rejected() {
        let err = parse_persona_document("test", "42").unwrap_err();
        assert!(err.to_string().contains("a number"));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = parse_persona_document("users.json", "{not json").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedConfiguration);
        assert!(err.to_string().contains("users.json"));
    }

    #[test]
    fn test_to_json_wraps_users() {
        let persona = Persona::new("user-1", "User 1").unwrap();
        let json = to_json([&persona]).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Users"][0]["Id"], "user-1");
    }
}
