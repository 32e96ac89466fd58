//! Error types for Stuntman
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - A category per error matching how callers are expected to react
//! - HTTP status mapping for errors surfaced during request handling
//! - User-friendly messages with suggestions and CLI exit codes

use std::fmt;
use std::path::PathBuf;

use http::StatusCode;
use thiserror::Error;

/// Result type alias for Stuntman operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,
    DuplicatePersona = 110,
    InvalidPersona = 111,
    MissingReturnUrl = 120,
    InvalidUri = 130,

    // Validation errors (2xx)
    MalformedAuthorization = 200,

    // Authorization errors (3xx)
    UnknownPersona = 300,
    UnknownAccessToken = 301,

    // Network and loading errors (4xx)
    NetworkFailed = 400,
    UpstreamStatus = 401,
    IoRead = 402,
    MalformedConfiguration = 410,

    // Internal errors (9xx)
    SessionFailed = 900,
    InternalError = 901,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an error is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fatal to the single operation or request; always raised.
    Configuration,
    /// Request is malformed; answered with 400.
    Validation,
    /// Offending identifier is unknown; answered with 403/404.
    Authorization,
    /// File, URL or peer could not be read.
    Network,
    /// Content was read but does not follow the federation contract.
    MalformedConfiguration,
    /// Host collaborator or serialization failure.
    Internal,
}

/// Main error type for Stuntman
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// A persona with the same id is already registered
    #[error("Persona must have unique Id; '{id}' is already registered")]
    DuplicatePersonaId { id: String },

    /// A persona field was empty or whitespace
    #[error("Invalid persona {field}: {reason}")]
    InvalidPersona { field: String, reason: String },

    /// Neither a ReturnUrl query parameter nor a Referer header was sent
    #[error("ReturnUrl was not specified via query string or Referer header.")]
    MissingReturnUrl,

    /// Input to a loader is not an absolute path or URL
    #[error("Invalid path or URL '{input}': {reason}")]
    InvalidUri { input: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────

    /// Authorization header did not split into a scheme and a token
    #[error("Authorization header is not in correct format.")]
    MalformedAuthorizationHeader,

    // ─────────────────────────────────────────────────────────────
    // Authorization Errors
    // ─────────────────────────────────────────────────────────────

    /// Sign-in override named an id that is not registered
    #[error("Stuntman options do not include the requested '{id}' user.")]
    UnknownPersona { id: String },

    /// Bearer token matched no persona
    #[error("Stuntman options do not include a user with the access token '{token}'.")]
    UnknownAccessToken { token: String },

    // ─────────────────────────────────────────────────────────────
    // Network / Loading Errors
    // ─────────────────────────────────────────────────────────────

    /// HTTP request could not be completed
    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request completed with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// Local file could not be read
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content does not follow the federation contract
    #[error("Malformed persona configuration from {origin}: {message}")]
    MalformedConfiguration {
        origin: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Host session mechanism failed
    #[error("Session error: {message}")]
    Session { message: String },

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::DuplicatePersonaId { .. } => ErrorCode::DuplicatePersona,
            Error::InvalidPersona { .. } => ErrorCode::InvalidPersona,
            Error::MissingReturnUrl => ErrorCode::MissingReturnUrl,
            Error::InvalidUri { .. } => ErrorCode::InvalidUri,

            Error::MalformedAuthorizationHeader => ErrorCode::MalformedAuthorization,

            Error::UnknownPersona { .. } => ErrorCode::UnknownPersona,
            Error::UnknownAccessToken { .. } => ErrorCode::UnknownAccessToken,

            Error::Http { .. } => ErrorCode::NetworkFailed,
            Error::HttpStatus { .. } => ErrorCode::UpstreamStatus,
            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::MalformedConfiguration { .. } => ErrorCode::MalformedConfiguration,

            Error::Session { .. } => ErrorCode::SessionFailed,
            Error::Json(_) => ErrorCode::InternalError,
            Error::Io(_) => ErrorCode::IoRead,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the taxonomy category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ConfigNotFound { .. }
            | Error::ConfigParse { .. }
            | Error::ConfigValidation { .. }
            | Error::Toml(_)
            | Error::DuplicatePersonaId { .. }
            | Error::InvalidPersona { .. }
            | Error::MissingReturnUrl
            | Error::InvalidUri { .. } => ErrorCategory::Configuration,

            Error::MalformedAuthorizationHeader => ErrorCategory::Validation,

            Error::UnknownPersona { .. } | Error::UnknownAccessToken { .. } => {
                ErrorCategory::Authorization
            }

            Error::Http { .. } | Error::HttpStatus { .. } | Error::IoRead { .. } | Error::Io(_) => {
                ErrorCategory::Network
            }

            Error::MalformedConfiguration { .. } => ErrorCategory::MalformedConfiguration,

            Error::Session { .. } | Error::Json(_) | Error::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// HTTP status used when this error ends a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MalformedAuthorizationHeader => StatusCode::BAD_REQUEST,
            Error::UnknownAccessToken { .. } => StatusCode::FORBIDDEN,
            Error::UnknownPersona { .. } => StatusCode::NOT_FOUND,
            Error::Http { .. } | Error::HttpStatus { .. } | Error::MalformedConfiguration { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => {
                Some("Run 'stuntman config init' to create a default configuration file.")
            }
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'stuntman config validate' to see details.",
            ),
            Error::ConfigValidation { .. } => {
                Some("Review the configuration file and fix the invalid values.")
            }
            Error::DuplicatePersonaId { .. } => {
                Some("Every persona needs its own Id. Check local personas and imported sources for clashes.")
            }
            Error::MissingReturnUrl => {
                Some("Pass ?ReturnUrl=<url> to the sign-in or sign-out endpoint.")
            }
            Error::InvalidUri { .. } => {
                Some("Use an absolute file path, a file:// URL, or an http(s):// URL.")
            }
            Error::Http { .. } | Error::HttpStatus { .. } => {
                Some("Check that the peer application is running and has server mode enabled.")
            }
            Error::MalformedConfiguration { .. } => Some(
                "Persona JSON must be {\"Users\": [...]} or a bare array of {\"Id\", \"Name\"} objects.",
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid persona error
    pub fn invalid_persona(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPersona {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid URI error
    pub fn invalid_uri(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUri {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed configuration error
    pub fn malformed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedConfiguration {
            origin: origin.into(),
            message: message.into(),
            source: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
