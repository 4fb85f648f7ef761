//! Error and rejection types for buff-core.
//!
//! Three families live here:
//!
//! - [`Rejection`]: why a single fragment produced no translation. These are
//!   expected outcomes. They are logged and dropped, never surfaced as
//!   failures of the surrounding unit.
//! - [`BuffError`]: a caller tried to put something into a [`BuffRecord`]
//!   that the key grammar does not allow.
//! - [`ConfigError`]: an [`EngineConfig`] that cannot be used.
//!
//! All three implement [`EngineError`] so log sites can classify them
//! uniformly.
//!
//! [`BuffRecord`]: crate::buff::BuffRecord
//! [`EngineConfig`]: crate::config::EngineConfig

/// Severity level of an error, used for log priority.
///
/// - **Expected**: partial coverage; the engine declined a fragment on purpose
/// - **Validation**: caller input rejected at an API boundary
/// - **Configuration**: the engine cannot be constructed as configured
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Declined translation. The steady state, not a bug.
    Expected,

    /// Invalid input handed to a public API (e.g. a key outside the grammar).
    Validation,

    /// Invalid configuration. The engine refuses to start.
    Configuration,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
        }
    }

    /// Returns true if this outcome belongs to normal partial coverage.
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::Expected)
    }
}

/// Common trait for all buff-core errors.
pub trait EngineError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Used as a structured field in log events and in tests.
    fn error_code(&self) -> &'static str;
}

/// Longest source excerpt kept inside a rejection.
const SNIPPET_LIMIT: usize = 48;

/// Shortens a source excerpt for diagnostics.
pub(crate) fn snippet(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Why a fragment did not translate.
///
/// Every variant collapses to "no result" for the fragment; the reason only
/// feeds logs and tests.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// A call form, identifier or table shape outside the known vocabulary.
    #[error("unrecognized construct `{0}`")]
    Unrecognized(String),

    /// A parameter-table path that does not resolve to a number.
    #[error("parameter path `{0}` did not resolve")]
    NotFound(String),

    /// A translation that still references an identifier outside the allow-list.
    #[error("output references disallowed identifier `{0}`")]
    UnsafeOutput(String),

    /// Symbol inlining revisited a name that is already being expanded.
    #[error("cyclic reference through `{0}`")]
    Cycle(String),

    /// Unbalanced brackets, quotes or missing operands.
    #[error("malformed source near `{0}`")]
    Malformed(String),

    /// Recursion exceeded the configured depth cap.
    #[error("recursion depth limit {0} exceeded")]
    DepthExceeded(usize),

    /// An aggregate where no argument translated.
    #[error("no argument of `{0}` translated")]
    EmptyAggregate(String),
}

impl Rejection {
    pub(crate) fn unrecognized(text: &str) -> Self {
        Self::Unrecognized(snippet(text))
    }

    pub(crate) fn malformed(text: &str) -> Self {
        Self::Malformed(snippet(text))
    }

    pub(crate) fn not_found(text: &str) -> Self {
        Self::NotFound(snippet(text))
    }
}

impl EngineError for Rejection {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Expected
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unrecognized(_) => "unrecognized",
            Self::NotFound(_) => "not_found",
            Self::UnsafeOutput(_) => "unsafe_output",
            Self::Cycle(_) => "cycle",
            Self::Malformed(_) => "malformed",
            Self::DepthExceeded(_) => "depth_exceeded",
            Self::EmptyAggregate(_) => "empty_aggregate",
        }
    }
}

/// Errors raised when populating a [`BuffRecord`](crate::buff::BuffRecord).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuffError {
    #[error("key `{key}` is outside the target key grammar")]
    KeyRejected { key: String },

    #[error("value for `{key}` is not a finite number")]
    NonFinite { key: String },
}

impl EngineError for BuffError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::KeyRejected { .. } => "key_rejected",
            Self::NonFinite { .. } => "non_finite",
        }
    }
}

/// Errors raised while validating an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("`{field}` must be a plain identifier, got `{value}`")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("`max_depth` must be at least 1")]
    InvalidDepth,

    #[error("`repair.max_passes` must be at least 1")]
    InvalidPasses,

    #[error("`team_count_fallback` must be a finite, non-negative number, got {0}")]
    InvalidFallback(f64),

    #[error("`{0}` must not be empty")]
    Empty(&'static str),

    #[error("repair pattern failed to compile")]
    Pattern(#[from] regex::Error),
}

impl EngineError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Configuration
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::InvalidDepth => "invalid_depth",
            Self::InvalidPasses => "invalid_passes",
            Self::InvalidFallback(_) => "invalid_fallback",
            Self::Empty(_) => "empty",
            Self::Pattern(_) => "pattern",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_expected() {
        let rejection = Rejection::Cycle("a".into());
        assert!(rejection.severity().is_expected());
        assert_eq!(rejection.error_code(), "cycle");
        assert_eq!(rejection.to_string(), "cyclic reference through `a`");
    }

    #[test]
    fn config_errors_block_startup() {
        let err = ConfigError::InvalidDepth;
        assert_eq!(err.severity(), ErrorSeverity::Configuration);
        assert!(!err.severity().is_expected());
    }

    #[test]
    fn snippets_are_truncated() {
        let long = "x".repeat(100);
        let short = snippet(&long);
        assert_eq!(short.chars().count(), SNIPPET_LIMIT + 1);
        assert!(short.ends_with('…'));
        assert_eq!(snippet("  sum(a)  "), "sum(a)");
    }
}
