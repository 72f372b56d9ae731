//! Canonical decomposition of predicates into testable paths
//!
//! A path addresses one feature of a predicate: its verb, its negation flag,
//! the presence of a slot label, or the word filling a slot. Nested
//! predicates contribute their own paths prefixed by the slot label they
//! sit under:
//!
//! ```text
//! wants(subject: alice, object: owns(subject: bob, object: cat))
//!
//! _verb
//! _neg
//! object._label
//! object._verb
//! object._neg
//! object.object._label
//! object.object._term
//! object.subject._label
//! object.subject._term
//! subject._label
//! subject._term
//! ```

use crate::storage::Storage;
use crate::{Filler, Predicate, ResourceLimits, TermId, TermKind, TermStore, TermsError, TermsResult};
use serde::Serialize;
use std::fmt;

pub const VERB_SEGMENT: &str = "_verb";
pub const NEGATION_SEGMENT: &str = "_neg";
pub const LABEL_SEGMENT: &str = "_label";
pub const VALUE_SEGMENT: &str = "_term";

/// The feature a path tests, read from its last segment
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PathTest {
    Verb,
    Negation,
    Label,
    Value,
}

/// Ordered tuple of segments addressing one feature of a predicate
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Parse the dotted form produced by `Display`
    #[cfg(test)]
    pub(crate) fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self(text.split('.').map(str::to_string).collect())
    }

    pub fn test(&self) -> Option<PathTest> {
        match self.0.last()?.as_str() {
            VERB_SEGMENT => Some(PathTest::Verb),
            NEGATION_SEGMENT => Some(PathTest::Negation),
            LABEL_SEGMENT => Some(PathTest::Label),
            VALUE_SEGMENT => Some(PathTest::Value),
            _ => None,
        }
    }

    /// Slot labels leading to the tested feature.
    /// For a label test this includes the label being tested.
    pub fn prefix(&self) -> &[String] {
        match self.0.split_last() {
            Some((_, prefix)) => prefix,
            None => &[],
        }
    }

    /// The label a label test checks for
    pub fn label(&self) -> Option<&str> {
        match self.test()? {
            PathTest::Label => self.prefix().last().map(String::as_str),
            _ => None,
        }
    }

    /// The same label test, but for `label` under the same parent
    pub fn with_label(&self, label: &str) -> Option<Path> {
        if self.test()? != PathTest::Label {
            return None;
        }
        let prefix = self.prefix();
        let mut segments = prefix[..prefix.len().saturating_sub(1)].to_vec();
        segments.push(label.to_string());
        segments.push(LABEL_SEGMENT.to_string());
        Some(Path(segments))
    }

    fn extend(prefix: &[String], tail: &[&str]) -> Self {
        let mut segments = prefix.to_vec();
        segments.extend(tail.iter().map(|s| s.to_string()));
        Self(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// What sits at a slot prefix inside a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located<'p> {
    Predicate(&'p Predicate),
    Term(TermId),
    /// The predicate has no slot along this prefix
    Missing,
    /// The prefix runs through a word, which has no slots
    Blocked(TermId),
}

/// Follow slot labels from the root predicate.
pub fn locate<'p>(pred: &'p Predicate, labels: &[String]) -> Located<'p> {
    let mut current = pred;
    for (i, label) in labels.iter().enumerate() {
        match current.arg(label) {
            None => return Located::Missing,
            Some(Filler::Predicate(inner)) => current = inner,
            Some(Filler::Word(id)) if i + 1 == labels.len() => return Located::Term(*id),
            Some(Filler::Word(id)) => return Located::Blocked(*id),
        }
    }
    Located::Predicate(current)
}

/// Derives the ordered path list of a predicate or pattern
pub struct PathIndexer<'a, S: Storage> {
    storage: &'a S,
    terms: &'a TermStore,
    limits: &'a ResourceLimits,
}

impl<'a, S: Storage> PathIndexer<'a, S> {
    pub fn new(storage: &'a S, terms: &'a TermStore, limits: &'a ResourceLimits) -> Self {
        Self {
            storage,
            terms,
            limits,
        }
    }

    /// Build a path for each testable feature of `pred`, in canonical order.
    pub fn paths(&self, pred: &Predicate) -> TermsResult<Vec<Path>> {
        let depth = pred.depth();
        if depth > self.limits.max_nesting_depth {
            return Err(TermsError::limit(
                "max_nesting_depth",
                self.limits.max_nesting_depth,
                depth,
                "Flatten the predicate or raise the nesting limit",
            ));
        }
        let mut paths = Vec::new();
        self.collect(pred, &[], &mut paths)?;
        Ok(paths)
    }

    fn collect(&self, pred: &Predicate, prefix: &[String], paths: &mut Vec<Path>) -> TermsResult<()> {
        paths.push(Path::extend(prefix, &[VERB_SEGMENT]));
        paths.push(Path::extend(prefix, &[NEGATION_SEGMENT]));

        // BTreeMap iteration is already sorted by label
        for (label, filler) in &pred.args {
            paths.push(Path::extend(prefix, &[label.as_str(), LABEL_SEGMENT]));
            let mut nested = prefix.to_vec();
            nested.push(label.clone());
            match filler {
                Filler::Predicate(inner) => self.collect(inner, &nested, paths)?,
                Filler::Word(id) => {
                    let term = self.terms.term(self.storage, *id)?;
                    match (term.kind, term.is_variable) {
                        (TermKind::Word | TermKind::Noun | TermKind::Verb, _) => {
                            paths.push(Path::extend(&nested, &[VALUE_SEGMENT]));
                        }
                        (TermKind::Exists, true) => {
                            paths.push(Path::extend(&nested, &[VERB_SEGMENT]));
                        }
                        (TermKind::Exists, false) => {
                            return Err(TermsError::UnsupportedSlotType {
                                label: Path::new(nested).to_string(),
                                reason: format!(
                                    "'{}' is a predicate term without arguments; only predicate variables may fill a slot this way",
                                    term.name
                                ),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
