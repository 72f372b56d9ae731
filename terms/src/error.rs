use thiserror::Error;

/// Error types for the Terms knowledge store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermsError {
    /// A term with this name is already registered
    #[error("Duplicate term: '{0}' is already defined")]
    DuplicateTerm(String),

    /// No term is registered under this name (or id)
    #[error("Term not found: '{0}'")]
    TermNotFound(String),

    /// The backing store violates one of its own invariants.
    /// Fatal: the store should be considered corrupted.
    #[error("Storage integrity error: {0}")]
    StorageIntegrity(String),

    /// Empty, repeated, mixed-kind or cyclic base list
    #[error("Invalid bases for '{name}': {reason}")]
    InvalidBases { name: String, reason: String },

    /// The requested word type cannot have instances defined through the lexicon
    #[error("Invalid word type for '{name}': '{word_type}' cannot be instantiated")]
    InvalidWordType { name: String, word_type: String },

    /// Two bases (or a base and an extra slot) declare the same label with unrelated types
    #[error("Slot conflict in '{name}': label '{label}' is declared as both '{first}' and '{second}'")]
    SlotConflict {
        name: String,
        label: String,
        first: String,
        second: String,
    },

    /// A slot filler cannot be decomposed into index paths
    #[error("Unsupported slot type at '{label}': {reason}")]
    UnsupportedSlotType { label: String, reason: String },

    /// A fact failed validation against its verb's declaration
    #[error("Invalid fact: {0}")]
    InvalidFact(String),

    /// A fact diverges in shape from facts already indexed at the same branch point
    #[error("Shape conflict: branch tests '{existing}' but the fact needs '{requested}'")]
    ShapeConflict { existing: String, requested: String },

    /// Transient contention in the backing store; the caller may retry
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    /// An operation ran before `TermStore::bootstrap`
    #[error("Term store has not been bootstrapped")]
    NotBootstrapped,

    /// Resource limit exceeded
    #[error(
        "Resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value}). {suggestion}"
    )]
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },

    /// Internal error without a more specific category
    #[error("Engine error: {0}")]
    Engine(String),
}

impl TermsError {
    /// Errors that signal a corrupted store rather than a bad request
    pub fn is_fatal(&self) -> bool {
        matches!(self, TermsError::StorageIntegrity(_))
    }

    /// Errors the caller may resolve by running the same operation again
    pub fn is_retryable(&self) -> bool {
        matches!(self, TermsError::StorageConflict(_))
    }

    pub(crate) fn limit(
        limit_name: &str,
        limit_value: usize,
        actual_value: usize,
        suggestion: impl Into<String>,
    ) -> Self {
        TermsError::ResourceLimitExceeded {
            limit_name: limit_name.to_string(),
            limit_value: limit_value.to_string(),
            actual_value: actual_value.to_string(),
            suggestion: suggestion.into(),
        }
    }
}

impl From<serde_json::Error> for TermsError {
    fn from(err: serde_json::Error) -> Self {
        TermsError::Engine(format!("JSON error: {}", err))
    }
}
