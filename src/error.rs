//! Error types for canvas-sentinel
//!
//! A detected tamper is *not* an error: it is a normal outcome surfaced as the
//! `"tampered"` sentinel (see [`crate::generator::FingerprintOutcome`]). The
//! variants here cover the conditions that are propagated to the caller as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::config::Primitive;

pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Rendering errors (1xx)
    RenderingUnavailable = 100,

    // Protection errors (2xx)
    GuardInstallationFailure = 200,

    // Environment errors (3xx)
    EnvironmentError = 300,
}

/// Main error type for canvas-sentinel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FingerprintError {
    /// Drawing surface, 2D context or pixel read-back is not available.
    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),

    /// Locking a primitive on its prototype failed. Recorded, never fatal.
    #[error("Guard installation failed for {primitive}: {reason}")]
    GuardInstallation { primitive: Primitive, reason: String },

    /// A required global (window, Object.defineProperty, ...) is missing.
    #[error("Environment error: {0}")]
    Environment(String),
}

impl FingerprintError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            FingerprintError::RenderingUnavailable(_) => ErrorCode::RenderingUnavailable,
            FingerprintError::GuardInstallation { .. } => ErrorCode::GuardInstallationFailure,
            FingerprintError::Environment(_) => ErrorCode::EnvironmentError,
        }
    }

    /// Whether this error must reach the caller.
    ///
    /// Guard installation failures are swallowed by the installer: the
    /// `Object.defineProperty` guard still goes in.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FingerprintError::GuardInstallation { .. })
    }

    /// Build a rendering error from a thrown JS value.
    pub fn rendering(context: &str, err: JsValue) -> Self {
        FingerprintError::RenderingUnavailable(format!("{}: {}", context, describe_js(&err)))
    }
}

impl From<FingerprintError> for JsValue {
    fn from(err: FingerprintError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Render a thrown JS value as text for error messages.
pub(crate) fn describe_js(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
