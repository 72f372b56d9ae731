//! Conjunctive join of per-pattern submatch sets

use super::{Bindings, Match};
use crate::network::FactId;
use crate::{ResourceLimits, TermId, TermsError, TermsResult};
use serde::Serialize;

/// One answer to a query: consistent bindings across every pattern, and
/// the facts (one per pattern, in pattern order) that support them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub bindings: Bindings,
    pub facts: Vec<FactId>,
}

impl Solution {
    pub fn get(&self, variable: &str) -> Option<TermId> {
        self.bindings.get(variable).copied()
    }

    /// Extend with a submatch if every shared variable agrees
    fn join(&self, submatch: &Match) -> Option<Solution> {
        let mut bindings = self.bindings.clone();
        for (name, value) in &submatch.bindings {
            match bindings.get(name) {
                Some(existing) if existing != value => return None,
                Some(_) => {}
                None => {
                    bindings.insert(name.clone(), *value);
                }
            }
        }
        let mut facts = self.facts.clone();
        facts.extend(submatch.fact);
        Some(Solution { bindings, facts })
    }
}

/// Join submatch sets, one set per pattern.
///
/// Rows from different sets combine only when every variable they share is
/// bound to the same value. No sets, or any empty set, yields no solutions.
/// `max_solutions` bounds every intermediate result, the first set included.
pub fn merge_submatches(
    submatches: &[Vec<Match>],
    limits: &ResourceLimits,
) -> TermsResult<Vec<Solution>> {
    let Some((first, rest)) = submatches.split_first() else {
        return Ok(Vec::new());
    };

    let mut rows: Vec<Solution> = first
        .iter()
        .map(|m| Solution {
            bindings: m.bindings.clone(),
            facts: m.fact.into_iter().collect(),
        })
        .collect();
    check_solutions(rows.len(), limits)?;

    for set in rest {
        let mut joined = Vec::new();
        for row in &rows {
            for submatch in set {
                if let Some(combined) = row.join(submatch) {
                    joined.push(combined);
                    check_solutions(joined.len(), limits)?;
                }
            }
        }
        rows = joined;
        if rows.is_empty() {
            break;
        }
    }
    Ok(rows)
}

fn check_solutions(count: usize, limits: &ResourceLimits) -> TermsResult<()> {
    if count > limits.max_solutions {
        return Err(TermsError::limit(
            "max_solutions",
            limits.max_solutions,
            count,
            "Add shared variables or more specific patterns to narrow the query",
        ));
    }
    Ok(())
}
