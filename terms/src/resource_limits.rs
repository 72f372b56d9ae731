use crate::{TermsError, TermsResult};
use serde::{Deserialize, Serialize};

/// Resource limits to keep assertions and queries bounded
///
/// These limits protect against pathological inputs while being generous enough
/// for all legitimate use cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum nesting of predicates inside predicates
    /// Real usage: ~3 levels, Limit: 32 (10x)
    pub max_nesting_depth: usize,

    /// Maximum number of patterns joined by a single query
    /// Real usage: 1-4, Limit: 16
    pub max_query_patterns: usize,

    /// Maximum number of rows produced while joining submatch sets
    pub max_solutions: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_nesting_depth: 32,
            max_query_patterns: 16,
            max_solutions: 100_000,
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read limits from a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> TermsResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TermsError::Engine(format!("Invalid resource limits: {}", e)))
    }
}
