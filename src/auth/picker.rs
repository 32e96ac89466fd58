//! Persona selection UI.
//!
//! The sign-in endpoint hands a [`SelectionView`] to a [`SelectionRenderer`]
//! when no persona was chosen. Hosts with their own templates implement the
//! trait; [`PersonaListRenderer`] is a plain HTML fallback.

use std::fmt;

use askama::Template;
use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::persona::{Persona, PersonaRegistry, PickerAlignment};

use super::request::{OVERRIDE_QUERY_KEY, RETURN_URL_QUERY_KEY};

// ─────────────────────────────────────────────────────────────────
// Palette
// ─────────────────────────────────────────────────────────────────

/// Brand colors used by the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StuntmanColor {
    DarkBlue,
    MediumBlue,
    LightBlue,
    Cream,
    Orange,
    Rust,
    Forest,
    Sage,
}

impl StuntmanColor {
    pub const ALL: [StuntmanColor; 8] = [
        StuntmanColor::DarkBlue,
        StuntmanColor::MediumBlue,
        StuntmanColor::LightBlue,
        StuntmanColor::Cream,
        StuntmanColor::Orange,
        StuntmanColor::Rust,
        StuntmanColor::Forest,
        StuntmanColor::Sage,
    ];

    /// CSS hex value.
    pub const fn hex(self) -> &'static str {
        match self {
            StuntmanColor::DarkBlue => "#002a4a",
            StuntmanColor::MediumBlue => "#17607d",
            StuntmanColor::LightBlue => "#3dbad1",
            StuntmanColor::Cream => "#fff1ce",
            StuntmanColor::Orange => "#ff9311",
            StuntmanColor::Rust => "#d64700",
            StuntmanColor::Forest => "#4f731a",
            StuntmanColor::Sage => "#019c77",
        }
    }
}

impl fmt::Display for StuntmanColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

// ─────────────────────────────────────────────────────────────────
// View
// ─────────────────────────────────────────────────────────────────

/// Everything a picker needs to render.
#[derive(Debug, Clone)]
pub struct SelectionView<'a> {
    pub return_url: Option<String>,
    pub personas: Vec<&'a Persona>,
    pub sign_in_uri: String,
    pub sign_out_uri: String,
    pub alignment: PickerAlignment,
}

impl<'a> SelectionView<'a> {
    pub fn new(registry: &'a PersonaRegistry, return_url: Option<String>) -> Self {
        Self {
            return_url,
            personas: registry.personas().collect(),
            sign_in_uri: registry.sign_in_uri(),
            sign_out_uri: registry.sign_out_uri(),
            alignment: registry.picker_alignment(),
        }
    }

    /// Sign-in link that assumes `persona` and comes back to the return URL.
    pub fn sign_in_href(&self, persona: &Persona) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(OVERRIDE_QUERY_KEY, persona.id());
        if let Some(url) = &self.return_url {
            query.append_pair(RETURN_URL_QUERY_KEY, url);
        }
        format!("{}?{}", self.sign_in_uri, query.finish())
    }

    pub fn sign_out_href(&self) -> String {
        match &self.return_url {
            Some(url) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(RETURN_URL_QUERY_KEY, url)
                    .finish();
                format!("{}?{}", self.sign_out_uri, query)
            }
            None => self.sign_out_uri.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Renderers
// ─────────────────────────────────────────────────────────────────

/// Turns a selection view into an HTML body.
pub trait SelectionRenderer: Send + Sync {
    fn render(&self, view: &SelectionView<'_>) -> Result<String>;
}

/// Minimal HTML list of sign-in links.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonaListRenderer;

impl SelectionRenderer for PersonaListRenderer {
    fn render(&self, view: &SelectionView<'_>) -> Result<String> {
        let page = PersonaListPage {
            alignment: view.alignment,
            entries: view
                .personas
                .iter()
                .map(|persona| PickerEntry {
                    href: view.sign_in_href(persona),
                    title: persona_title(persona),
                    name: persona.name().to_string(),
                })
                .collect(),
            sign_out_href: view.sign_out_href(),
            background: StuntmanColor::DarkBlue.hex(),
            foreground: StuntmanColor::Cream.hex(),
            heading: StuntmanColor::Orange.hex(),
            link: StuntmanColor::LightBlue.hex(),
            sign_out: StuntmanColor::Rust.hex(),
        };

        page.render()
            .map_err(|e| Error::Internal(format!("Failed to render persona picker: {}", e)))
    }
}

#[derive(Template)]
#[template(path = "persona_list.html")]
struct PersonaListPage {
    alignment: PickerAlignment,
    entries: Vec<PickerEntry>,
    sign_out_href: String,
    background: &'static str,
    foreground: &'static str,
    heading: &'static str,
    link: &'static str,
    sign_out: &'static str,
}

struct PickerEntry {
    href: String,
    title: String,
    name: String,
}

/// Description and source, one per line.
fn persona_title(persona: &Persona) -> String {
    let mut lines = Vec::new();
    if let Some(description) = persona.description() {
        lines.push(description.to_string());
    }
    if let Some(source) = persona.source() {
        lines.push(format!("Source: {}", source));
    }
    lines.join("\n")
}
