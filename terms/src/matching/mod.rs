//! Pattern matching over the discrimination network
//!
//! Answers a query in two phases:
//! 1. Dispatch each pattern from the network root, producing its submatch set
//! 2. Join the submatch sets on shared variables

pub mod join;

pub use join::{merge_submatches, Solution};

use crate::network::{load_node, Discriminant, FactId, FactNode, Network, NodeCategory};
use crate::paths::{locate, Located, Path, PathIndexer};
use crate::storage::Storage;
use crate::{Predicate, ResourceLimits, TermId, TermStore, TermsError, TermsResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Variable name -> bound term
pub type Bindings = BTreeMap<String, TermId>;

/// Matching state for one branch of a dispatch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Match {
    /// Paths of the pattern not yet satisfied
    pub paths: BTreeSet<Path>,
    pub bindings: Bindings,
    /// Set once the branch reaches a stored fact
    pub fact: Option<FactId>,
}

impl Match {
    pub fn new(paths: impl IntoIterator<Item = Path>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            bindings: Bindings::new(),
            fact: None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.paths.is_empty()
    }

    /// Drop a path if the pattern asked for it. Returns whether it did.
    pub fn consume(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }
}

/// Which children of a node a pattern accepts
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    /// Labels, and features the pattern leaves open
    Every,
    Exact(Discriminant),
    /// An unbound variable: every child whose term is a candidate binds it
    Fresh {
        variable: String,
        candidates: BTreeSet<TermId>,
    },
    Nothing,
}

pub struct MatchEngine<'a, S: Storage> {
    storage: &'a S,
    terms: &'a TermStore,
    network: &'a Network,
    limits: &'a ResourceLimits,
}

impl<'a, S: Storage> MatchEngine<'a, S> {
    pub fn new(
        storage: &'a S,
        terms: &'a TermStore,
        network: &'a Network,
        limits: &'a ResourceLimits,
    ) -> Self {
        Self {
            storage,
            terms,
            network,
            limits,
        }
    }

    /// Every consistent set of bindings satisfying all `patterns` at once
    pub fn query(&self, patterns: &[Predicate]) -> TermsResult<Vec<Solution>> {
        if patterns.len() > self.limits.max_query_patterns {
            return Err(TermsError::limit(
                "max_query_patterns",
                self.limits.max_query_patterns,
                patterns.len(),
                "Split the query into smaller conjunctions",
            ));
        }
        for pattern in patterns {
            for id in pattern.term_ids() {
                self.terms.term(self.storage, id)?;
            }
        }

        let root = load_node(self.storage, self.network.root())?;
        if patterns.is_empty() || root.child_path.is_none() {
            return Ok(Vec::new());
        }

        let indexer = PathIndexer::new(self.storage, self.terms, self.limits);
        let mut submatches = Vec::with_capacity(patterns.len());
        for (index, pattern) in patterns.iter().enumerate() {
            let paths = indexer.paths(pattern)?;
            let mut found = Vec::new();
            self.dispatch(&root, pattern, Match::new(paths), &mut found)?;
            debug!(pattern = index, submatches = found.len(), "dispatched pattern");
            if found.is_empty() {
                return Ok(Vec::new());
            }
            submatches.push(found);
        }

        let solutions = merge_submatches(&submatches, self.limits)?;
        debug!(patterns = patterns.len(), solutions = solutions.len(), "query complete");
        Ok(solutions)
    }

    /// Walk the network below `node`, collecting every match of `pattern`
    /// that reaches a stored fact with no pattern path left unsatisfied.
    pub fn dispatch(
        &self,
        node: &FactNode,
        pattern: &Predicate,
        mut current: Match,
        matches: &mut Vec<Match>,
    ) -> TermsResult<()> {
        if let Some(fact) = node.terminal {
            if current.is_satisfied() {
                matches.push(Match {
                    fact: Some(fact),
                    ..current.clone()
                });
            }
        }

        let Some(path) = node.child_path.clone() else {
            return Ok(());
        };
        current.consume(&path);

        let test = path
            .test()
            .ok_or_else(|| TermsError::Engine(format!("path '{}' has no test segment", path)))?;
        let category = NodeCategory::for_test(test);
        let selection = self.select(pattern, &path, category, &current)?;

        let children = match &selection {
            Selection::Every => self
                .storage
                .children_matching(node.id, &|d| d.category() == category),
            Selection::Exact(discriminant) => self
                .storage
                .node_child(node.id, discriminant)
                .map(|id| load_node(self.storage, id))
                .transpose()?
                .into_iter()
                .collect(),
            Selection::Fresh { candidates, .. } => {
                self.storage.children_matching(node.id, &|d| {
                    d.category() == category && d.term().is_some_and(|t| candidates.contains(&t))
                })
            }
            Selection::Nothing => Vec::new(),
        };

        for child in children {
            let mut next = current.clone();
            if let Discriminant::Label(label) = &child.discriminant {
                // Label tests can be satisfied here even when the pattern
                // lists them under another position; absent ones are ignored.
                if let Some(label_path) = path.with_label(label) {
                    next.consume(&label_path);
                }
            }
            if let Selection::Fresh { variable, .. } = &selection {
                if let Some(term) = child.discriminant.term() {
                    next.bindings.insert(variable.clone(), term);
                }
            }
            self.dispatch(&child, pattern, next, matches)?;
        }
        Ok(())
    }

    /// What the pattern wants from the children testing `path`
    fn select(
        &self,
        pattern: &Predicate,
        path: &Path,
        category: NodeCategory,
        current: &Match,
    ) -> TermsResult<Selection> {
        let located = locate(pattern, path.prefix());
        let selection = match (category, located) {
            (NodeCategory::Root, _) => Selection::Nothing,
            (NodeCategory::Label, _) => Selection::Every,
            (_, Located::Missing) => Selection::Every,

            (NodeCategory::Negation, Located::Predicate(p)) => {
                Selection::Exact(Discriminant::Negation(p.negated))
            }
            (NodeCategory::Verb, Located::Predicate(p)) => {
                self.select_term(p.verb, category, current)?
            }
            (NodeCategory::Value, Located::Predicate(_)) => Selection::Nothing,

            (NodeCategory::Verb | NodeCategory::Value, Located::Term(id)) => {
                if category == NodeCategory::Value || self.is_variable(id)? {
                    self.select_term(id, category, current)?
                } else {
                    Selection::Nothing
                }
            }
            // Below a variable standing for a whole predicate anything goes
            (NodeCategory::Negation, Located::Term(id)) | (_, Located::Blocked(id)) => {
                if self.is_variable(id)? {
                    Selection::Every
                } else {
                    Selection::Nothing
                }
            }
        };
        Ok(selection)
    }

    fn select_term(
        &self,
        id: TermId,
        category: NodeCategory,
        current: &Match,
    ) -> TermsResult<Selection> {
        let term = self.terms.term(self.storage, id)?;
        let wrap = |id: TermId| {
            Discriminant::for_term(category, id).ok_or_else(|| {
                TermsError::Engine(format!("{} nodes do not carry terms", category.name()))
            })
        };

        if !term.is_variable {
            return Ok(Selection::Exact(wrap(id)?));
        }
        if let Some(bound) = current.bindings.get(&term.name) {
            return Ok(Selection::Exact(wrap(*bound)?));
        }
        let constraint = self.terms.constraint_of(&term)?;
        Ok(Selection::Fresh {
            variable: term.name,
            candidates: self.terms.subtree(self.storage, constraint)?,
        })
    }

    fn is_variable(&self, id: TermId) -> TermsResult<bool> {
        Ok(self.terms.term(self.storage, id)?.is_variable)
    }
}
