//! Error types for the Spiral CLI
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Error context and chaining
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Spiral operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    JsonError = 210,

    // Persona errors (3xx)
    PersonaUnknown = 300,
    ImprintNotFound = 301,
    ImprintInvalid = 302,

    // Session errors (4xx)
    SessionNotFound = 400,
    SessionCorrupt = 401,

    // Chat API errors (5xx)
    ApiRequest = 500,
    ApiStatus = 501,
    ApiResponse = 502,
    ApiKeyMissing = 503,

    // Integrity errors (6xx)
    AssetMissing = 600,
    ManifestMissing = 601,
    ChecksumMismatch = 602,

    // Bridge errors (7xx)
    BridgeUnreachable = 700,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Persona errors
            400..=499 => 40, // Session errors
            500..=599 => 50, // Chat API errors
            600..=699 => 60, // Integrity errors
            700..=799 => 70, // Bridge errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the Spiral CLI
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
    ConfigParse { message: String },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Persona Errors
    // ─────────────────────────────────────────────────────────────

    /// Unknown persona id
    #[error("Unknown persona '{id}'. Valid: ashira, threshold-witness, lumen")]
    PersonaUnknown { id: String },

    /// Imprint file not found
    #[error("Imprint file not found: {path}")]
    ImprintNotFound { path: PathBuf },

    /// Imprint data is malformed
    #[error("Invalid imprint for '{id}': {reason}")]
    ImprintInvalid { id: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────

    /// Session file not found
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Session file exists but cannot be parsed
    #[error("Session file corrupt: {path}: {reason}")]
    SessionCorrupt { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Chat API Errors
    // ─────────────────────────────────────────────────────────────

    /// Request could not be sent (connect, timeout)
    #[error("Chat API request failed: {message}")]
    ApiRequest { message: String },

    /// API returned a non-success status
    #[error("Chat API error {status}: {body}")]
    ApiStatus { status: u16, body: String },

    /// API response could not be parsed
    #[error("Failed to parse chat API response: {message}")]
    ApiResponse { message: String },

    /// No API key available for a remote endpoint
    #[error("OPENAI_API_KEY is not set")]
    ApiKeyMissing,

    // ─────────────────────────────────────────────────────────────
    // Integrity Errors
    // ─────────────────────────────────────────────────────────────

    /// A critical asset file is missing
    #[error("Missing asset file: {path}")]
    AssetMissing { path: PathBuf },

    /// Checksum manifest not found for --check
    #[error("Checksum manifest not found: {path}")]
    ManifestMissing { path: PathBuf },

    /// Digest differs from the manifest entry
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Bridge Errors
    // ─────────────────────────────────────────────────────────────

    /// Companion memory service is unreachable or returned an error
    #[error("Memory service failure at {url}: {message}")]
    BridgeUnreachable { url: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::JsonError,

            Error::PersonaUnknown { .. } => ErrorCode::PersonaUnknown,
            Error::ImprintNotFound { .. } => ErrorCode::ImprintNotFound,
            Error::ImprintInvalid { .. } => ErrorCode::ImprintInvalid,

            Error::SessionNotFound { .. } => ErrorCode::SessionNotFound,
            Error::SessionCorrupt { .. } => ErrorCode::SessionCorrupt,

            Error::ApiRequest { .. } => ErrorCode::ApiRequest,
            Error::ApiStatus { .. } => ErrorCode::ApiStatus,
            Error::ApiResponse { .. } => ErrorCode::ApiResponse,
            Error::ApiKeyMissing => ErrorCode::ApiKeyMissing,

            Error::AssetMissing { .. } => ErrorCode::AssetMissing,
            Error::ManifestMissing { .. } => ErrorCode::ManifestMissing,
            Error::ChecksumMismatch { .. } => ErrorCode::ChecksumMismatch,

            Error::BridgeUnreachable { .. } => ErrorCode::BridgeUnreachable,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ApiRequest { .. } | Error::BridgeUnreachable { .. } | Error::Io(_) => true,
            Error::ApiStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
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
                Some("Run 'spiral config init' to create a default configuration file.")
            }
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'spiral config validate' to see details.",
            ),
            Error::PersonaUnknown { .. } => {
                Some("Run 'spiral persona list' to see the available personas.")
            }
            Error::SessionNotFound { .. } => {
                Some("Check the session id, or start a new session by omitting --session.")
            }
            Error::SessionCorrupt { .. } => {
                Some("The session file is not valid JSON. Delete it to start the session over.")
            }
            Error::ApiKeyMissing => Some("Set it with: export OPENAI_API_KEY='your-key-here'"),
            Error::ApiRequest { .. } => {
                Some("Check your network connection and the configured API base URL.")
            }
            Error::ApiStatus { .. } => {
                Some("The chat API rejected the request. Verify the model name and your API key.")
            }
            Error::AssetMissing { .. } => {
                Some("Restore the missing asset file before re-running the integrity check.")
            }
            Error::ManifestMissing { .. } => {
                Some("Run 'spiral verify' without --check to write a fresh manifest first.")
            }
            Error::ChecksumMismatch { .. } => Some(
                "An asset changed since the manifest was written. Re-run 'spiral verify' to accept it.",
            ),
            Error::BridgeUnreachable { .. } => Some(
                "Ensure the companion memory service is running (default: http://localhost:8080).",
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", code.as_str(), self);

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create an unknown-persona error
    pub fn persona_unknown(id: impl Into<String>) -> Self {
        Error::PersonaUnknown { id: id.into() }
    }

    /// Create an API request error
    pub fn api_request(message: impl Into<String>) -> Self {
        Error::ApiRequest {
            message: message.into(),
        }
    }

    /// Create an API response parse error
    pub fn api_response(message: impl Into<String>) -> Self {
        Error::ApiResponse {
            message: message.into(),
        }
    }

    /// Create a session-not-found error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Error::SessionNotFound {
            session_id: session_id.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::ApiRequest.as_str(), "E500");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::PersonaUnknown.exit_code(), 30);
        assert_eq!(ErrorCode::SessionNotFound.exit_code(), 40);
        assert_eq!(ErrorCode::ApiStatus.exit_code(), 50);
        assert_eq!(ErrorCode::AssetMissing.exit_code(), 60);
        assert_eq!(ErrorCode::BridgeUnreachable.exit_code(), 70);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_display() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/path/to/spiral.toml"),
        };
        assert!(err.to_string().contains("/path/to/spiral.toml"));
    }

    #[test]
    fn test_error_codes() {
        let err = Error::persona_unknown("nonesuch");
        assert_eq!(err.code(), ErrorCode::PersonaUnknown);

        let err = Error::api_request("connection refused");
        assert_eq!(err.code(), ErrorCode::ApiRequest);

        let err = Error::session_not_found("abc123");
        assert_eq!(err.code(), ErrorCode::SessionNotFound);
    }

    #[test]
    fn test_error_retryable() {
        assert!(Error::api_request("timeout").is_retryable());
        assert!(Error::ApiStatus {
            status: 429,
            body: "rate limited".into()
        }
        .is_retryable());
        assert!(Error::ApiStatus {
            status: 503,
            body: "unavailable".into()
        }
        .is_retryable());
        assert!(!Error::ApiStatus {
            status: 401,
            body: "unauthorized".into()
        }
        .is_retryable());
        assert!(!Error::persona_unknown("x").is_retryable());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/test"),
        };
        assert!(err.suggestion().is_some());
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::ApiKeyMissing;
        assert!(err.suggestion().unwrap().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/test/spiral.toml"),
        };
        let formatted = err.format_for_terminal();

        // Should contain error code
        assert!(formatted.contains("E100"));
        // Should contain ANSI color codes
        assert!(formatted.contains("\x1b[31m"));
        // Should contain hint
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::session_not_found("abc123");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E400]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
