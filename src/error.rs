//! Error taxonomy.
//!
//! Hard failures only. Soft-degradation conditions (unresolved typedesc,
//! missing path value, missing XML element, unparsable numeric table leaf)
//! are logged and defaulted at the site that detects them; they never
//! surface as `Err`.

use thiserror::Error;

/// Build-session lifecycle violations.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Starting a second generation run without resetting the session would
    /// silently merge two generations; fail fast instead.
    #[error("a build session is already active; reset it before starting another generation run")]
    SessionActive,

    #[error("no build session is active")]
    SessionNotStarted,
}

/// Table/grid transformation failures. A corrupted grid must surface to the
/// caller, never collapse into an empty array.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("malformed {element_kind} table payload for parameter {index}")]
    Parse {
        element_kind: String,
        index: i32,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-call marshaling failures: configuration errors (the generated
/// artifact is inconsistent with the call site) and coercion errors
/// (malformed input for a declared kind). Both abort the one call that hit
/// them, not the host process.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("generated artifact is missing `{key}`: no template variable bound for parameter {index}")]
    MissingParamName { key: String, index: i32 },

    #[error("cannot parse `{text}` as {kind} for parameter `{name}`")]
    Coercion {
        name: String,
        kind: &'static str,
        text: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("malformed JSON bound to parameter `{name}`")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build {what} for parameter `{name}` (index {index})")]
    Composite {
        what: &'static str,
        name: String,
        index: i32,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}
