use crate::matching::Solution;
use crate::storage::Storage;
use crate::{Filler, Predicate, TermStore, TermsError, TermsResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Query results with every id resolved to a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// The patterns as written, e.g. `likes(object: Y, subject: X)`
    pub patterns: Vec<String>,
    pub solutions: Vec<SolutionRecord>,
}

/// One solution: variable bindings and the facts that support them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolutionRecord {
    pub bindings: BTreeMap<String, String>,
    pub facts: Vec<String>,
}

impl Response {
    pub fn build<S: Storage>(
        storage: &S,
        terms: &TermStore,
        patterns: &[Predicate],
        solutions: &[Solution],
    ) -> TermsResult<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| render_predicate(storage, terms, pattern))
            .collect::<TermsResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(solutions.len());
        for solution in solutions {
            let mut bindings = BTreeMap::new();
            for (variable, id) in &solution.bindings {
                bindings.insert(variable.clone(), terms.term(storage, *id)?.name);
            }
            let mut facts = Vec::with_capacity(solution.facts.len());
            for fact_id in &solution.facts {
                let fact = storage.fact(*fact_id).ok_or_else(|| {
                    TermsError::StorageIntegrity(format!("fact {} is missing", fact_id.0))
                })?;
                facts.push(render_predicate(storage, terms, &fact.predicate)?);
            }
            records.push(SolutionRecord { bindings, facts });
        }

        Ok(Self {
            patterns,
            solutions: records,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn to_json(&self) -> TermsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `verb(label: filler, ...)`, labels in sorted order, `!` in front when negated
pub fn render_predicate<S: Storage>(
    storage: &S,
    terms: &TermStore,
    pred: &Predicate,
) -> TermsResult<String> {
    let verb = terms.term(storage, pred.verb)?.name;
    let mut args = Vec::with_capacity(pred.args.len());
    for (label, filler) in &pred.args {
        let value = match filler {
            Filler::Word(id) => terms.term(storage, *id)?.name,
            Filler::Predicate(inner) => render_predicate(storage, terms, inner)?,
        };
        args.push(format!("{}: {}", label, value));
    }
    let negation = if pred.negated { "!" } else { "" };
    Ok(format!("{}{}({})", negation, verb, args.join(", ")))
}
