//! Error types for Press operations
//!
//! Every error is request-scoped: none of them is fatal to the process.
//! Each variant carries:
//! - A human-readable message
//! - A stable error code for programmatic handling
//! - A category for grouping
//! - An HTTP status code for the layer that emits the final response
//!
//! # Example
//!
//! ```rust
//! use press_core::error::{PressError, ErrorCategory};
//!
//! fn handle_error(err: PressError) {
//!     match err.category() {
//!         ErrorCategory::NotFound => println!("Nothing here"),
//!         ErrorCategory::Validation => println!("Bad input"),
//!         ErrorCategory::Authorization => println!("Access denied"),
//!         _ => println!("Other error"),
//!     }
//!
//!     let status = err.http_status_code();
//!     assert!(status >= 400);
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Press operations
pub type Result<T> = std::result::Result<T, PressError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Nothing matches the request (404)
    NotFound,
    /// Input validation failed (400)
    Validation,
    /// Visibility or hook denial (403)
    Authorization,
    /// Registration conflict (409)
    Conflict,
    /// Internal error (500)
    Internal,
    /// Collaborator failure: repository, filesystem, renderer (502)
    External,
}

/// Errors that can occur while resolving and rendering content
#[derive(Error, Debug)]
pub enum PressError {
    // ═══════════════════════════════════════════════════════════════════════
    // Query resolution errors
    // ═══════════════════════════════════════════════════════════════════════

    /// No entity matches the classified request
    #[error("Content not found: {what}")]
    EntityNotFound { what: String },

    /// Taxonomy term lookup failed
    #[error("Term '{slug}' not found in taxonomy '{taxonomy}'")]
    TermNotFound { taxonomy: String, slug: String },

    /// Author lookup failed
    #[error("Author not found: '{nicename}'")]
    AuthorNotFound { nicename: String },

    /// Taxonomy is not registered
    #[error("Unknown taxonomy: '{taxonomy}'. Register it before querying its terms.")]
    UnknownTaxonomy { taxonomy: String },

    /// Year/month/day parameters outside the representable calendar
    #[error("Invalid date range: {reason}")]
    InvalidDateRange { reason: String },

    /// Query parameters are malformed
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Visibility errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Private entity and the authorization hook refused the session
    #[error("Not authorized to view entity {entity_id}")]
    Unauthorized { entity_id: u64 },

    /// A before-show hook denied rendering
    #[error("Access denied by hook '{hook}': {message}")]
    AccessDenied {
        hook: String,
        message: String,
        redirect: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // View errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Candidate view does not exist (recovered by the view loop)
    #[error("View not found: '{view}'")]
    ViewNotFound { view: String },

    /// The guaranteed default view is missing
    #[error("Default view '{view}' is missing. Every theme must provide it.")]
    DefaultViewMissing { view: String },

    /// Renderer failed for a reason other than a missing view
    #[error("Rendering view '{view}' failed: {reason}")]
    RenderFailed { view: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Revision errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Preview token does not match the revision (degrades silently)
    #[error("Revision token mismatch for revision '{revision_id}'")]
    RevisionTokenMismatch { revision_id: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Registry and configuration errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Registry manifest or descriptor is invalid
    #[error("Invalid content registry: {reason}")]
    InvalidRegistry { reason: String },

    /// Post type or taxonomy registered twice
    #[error("Already registered: '{name}'")]
    AlreadyRegistered { name: String },

    /// Site configuration is invalid
    #[error("Invalid site configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Failed to read a configuration or fixture file
    #[error("Failed to load '{path}': {reason}")]
    LoadError { path: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Repository lock is poisoned
    #[error("Content repository lock poisoned. This is a bug; please report it.")]
    RepositoryLocked,

    /// Repository backend failed
    #[error("Content repository error: {reason}")]
    RepositoryError { reason: String },

    /// I/O operation failed
    #[error("IO error: {message}")]
    IoError { message: String },

    /// Internal error that shouldn't happen
    #[error("Internal error: {reason}. This is a bug; please report it.")]
    InternalError { reason: String },
}

impl PressError {
    /// Shorthand for [`PressError::EntityNotFound`]
    pub fn not_found(what: impl Into<String>) -> Self {
        PressError::EntityNotFound { what: what.into() }
    }

    /// Returns true if the caller may recover locally and carry on
    ///
    /// Only a missing candidate view and a rejected preview token are
    /// recovered inside the pipeline; both are never shown to the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PressError::ViewNotFound { .. } | PressError::RevisionTokenMismatch { .. }
        )
    }

    /// Returns true for the "view missing" signal the view loop skips over
    pub fn is_view_not_found(&self) -> bool {
        matches!(self, PressError::ViewNotFound { .. })
    }

    /// Returns true if this error is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self.http_status_code(), 400..=499)
    }

    /// Returns true if this error is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        matches!(self.http_status_code(), 500..=599)
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            PressError::EntityNotFound { .. }
            | PressError::TermNotFound { .. }
            | PressError::AuthorNotFound { .. }
            | PressError::UnknownTaxonomy { .. }
            | PressError::ViewNotFound { .. } => ErrorCategory::NotFound,

            PressError::InvalidDateRange { .. }
            | PressError::InvalidRequest { .. }
            | PressError::RevisionTokenMismatch { .. }
            | PressError::InvalidRegistry { .. }
            | PressError::InvalidConfig { .. } => ErrorCategory::Validation,

            PressError::Unauthorized { .. } | PressError::AccessDenied { .. } => {
                ErrorCategory::Authorization
            }

            PressError::AlreadyRegistered { .. } => ErrorCategory::Conflict,

            PressError::DefaultViewMissing { .. }
            | PressError::RepositoryLocked
            | PressError::InternalError { .. } => ErrorCategory::Internal,

            PressError::RenderFailed { .. }
            | PressError::LoadError { .. }
            | PressError::JsonError(_)
            | PressError::RepositoryError { .. }
            | PressError::IoError { .. } => ErrorCategory::External,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PressError::EntityNotFound { .. } => "ENTITY_NOT_FOUND",
            PressError::TermNotFound { .. } => "TERM_NOT_FOUND",
            PressError::AuthorNotFound { .. } => "AUTHOR_NOT_FOUND",
            PressError::UnknownTaxonomy { .. } => "UNKNOWN_TAXONOMY",
            PressError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            PressError::InvalidRequest { .. } => "INVALID_REQUEST",
            PressError::Unauthorized { .. } => "UNAUTHORIZED",
            PressError::AccessDenied { .. } => "ACCESS_DENIED",
            PressError::ViewNotFound { .. } => "VIEW_NOT_FOUND",
            PressError::DefaultViewMissing { .. } => "DEFAULT_VIEW_MISSING",
            PressError::RenderFailed { .. } => "RENDER_FAILED",
            PressError::RevisionTokenMismatch { .. } => "REVISION_TOKEN_MISMATCH",
            PressError::InvalidRegistry { .. } => "INVALID_REGISTRY",
            PressError::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            PressError::InvalidConfig { .. } => "INVALID_CONFIG",
            PressError::LoadError { .. } => "LOAD_ERROR",
            PressError::JsonError(_) => "JSON_ERROR",
            PressError::RepositoryLocked => "REPOSITORY_LOCKED",
            PressError::RepositoryError { .. } => "REPOSITORY_ERROR",
            PressError::IoError { .. } => "IO_ERROR",
            PressError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client sent invalid data
            PressError::InvalidDateRange { .. }
            | PressError::InvalidRequest { .. }
            | PressError::RevisionTokenMismatch { .. }
            | PressError::InvalidRegistry { .. }
            | PressError::InvalidConfig { .. } => 400,

            // 403 Forbidden - Visibility denied
            PressError::Unauthorized { .. } | PressError::AccessDenied { .. } => 403,

            // 404 Not Found - Nothing matches
            PressError::EntityNotFound { .. }
            | PressError::TermNotFound { .. }
            | PressError::AuthorNotFound { .. }
            | PressError::UnknownTaxonomy { .. }
            | PressError::ViewNotFound { .. } => 404,

            // 409 Conflict - Duplicate registration
            PressError::AlreadyRegistered { .. } => 409,

            // 500 Internal Server Error - Our fault
            PressError::DefaultViewMissing { .. }
            | PressError::RepositoryLocked
            | PressError::InternalError { .. } => 500,

            // 502 Bad Gateway - Collaborator failed
            PressError::RenderFailed { .. }
            | PressError::LoadError { .. }
            | PressError::JsonError(_)
            | PressError::RepositoryError { .. }
            | PressError::IoError { .. } => 502,
        }
    }

    /// Converts this error to a JSON-serializable response object
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

/// JSON-serializable error response for APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "ENTITY_NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Whether the pipeline recovers from it locally
    pub recoverable: bool,
}
