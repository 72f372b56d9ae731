//! Data model: terms, slots, predicates and their fillers

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Unique identifier of a term, assigned by storage
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TermId(pub usize);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a term denotes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    /// Individuals (`alice`) and the root `word`
    Word,
    /// Noun types: `noun`, `thing` and user-defined nouns
    Noun,
    /// Verb types: `verb`, `exists` and user-defined verbs
    Verb,
    /// Predicate-instance terms; only variables of this kind can fill slots
    Exists,
}

impl TermKind {
    /// Returns a human-readable name for the kind
    pub fn name(&self) -> &'static str {
        match self {
            TermKind::Word => "word",
            TermKind::Noun => "noun",
            TermKind::Verb => "verb",
            TermKind::Exists => "exists",
        }
    }
}

/// A named argument position of a verb and the type its fillers must have
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Slot {
    pub label: String,
    pub constraint: TermId,
}

impl Slot {
    pub fn new(label: impl Into<String>, constraint: TermId) -> Self {
        Self {
            label: label.into(),
            constraint,
        }
    }
}

/// A registered term
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub kind: TermKind,
    pub bases: Vec<TermId>,
    /// The term this one is an instance of. `None` only for `word`.
    pub term_type: Option<TermId>,
    /// Own and inherited slots, in declaration order
    pub slots: Vec<Slot>,
    pub is_variable: bool,
}

impl Term {
    pub fn slot(&self, label: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.label == label)
    }

    /// The type a variable ranges over: its first base, or else its type
    pub fn constraint(&self) -> Option<TermId> {
        self.bases.first().copied().or(self.term_type)
    }
}

/// A term before storage has assigned it an id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermDraft {
    pub name: String,
    pub kind: TermKind,
    pub bases: Vec<TermId>,
    pub term_type: Option<TermId>,
    pub slots: Vec<Slot>,
}

impl TermDraft {
    pub fn into_term(self, id: TermId) -> Term {
        let is_variable = is_variable_name(&self.name);
        Term {
            id,
            name: self.name,
            kind: self.kind,
            bases: self.bases,
            term_type: self.term_type,
            slots: self.slots,
            is_variable,
        }
    }
}

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*$").expect("valid variable pattern"))
}

fn instance_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z][a-z_]*[a-z])[1-9][0-9]*$").expect("valid instance pattern")
    })
}

/// Variables start with an uppercase letter: `X`, `Person1`
pub fn is_variable_name(name: &str) -> bool {
    variable_pattern().is_match(name)
}

/// For generated instance names such as `person12`, the noun they belong to (`person`)
pub fn instance_noun(name: &str) -> Option<&str> {
    instance_pattern()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The value held by a predicate slot
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filler {
    Word(TermId),
    Predicate(Box<Predicate>),
}

impl From<TermId> for Filler {
    fn from(id: TermId) -> Self {
        Filler::Word(id)
    }
}

impl From<Predicate> for Filler {
    fn from(pred: Predicate) -> Self {
        Filler::Predicate(Box::new(pred))
    }
}

/// An instance of a verb: a fact when ground, a pattern when it holds variables
///
/// Arguments are kept sorted by label, which makes structurally identical
/// predicates compare (and index) identically however they were built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Predicate {
    pub verb: TermId,
    pub negated: bool,
    pub args: BTreeMap<String, Filler>,
}

impl Predicate {
    pub fn new(verb: TermId) -> Self {
        Self {
            verb,
            negated: false,
            args: BTreeMap::new(),
        }
    }

    /// Builder-style slot assignment
    pub fn with(mut self, label: impl Into<String>, filler: impl Into<Filler>) -> Self {
        self.args.insert(label.into(), filler.into());
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn arg(&self, label: &str) -> Option<&Filler> {
        self.args.get(label)
    }

    /// Nesting depth: 1 for a flat predicate
    pub fn depth(&self) -> usize {
        1 + self
            .args
            .values()
            .map(|filler| match filler {
                Filler::Predicate(inner) => inner.depth(),
                Filler::Word(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }

    /// Every term id mentioned by the predicate, verbs included
    pub fn term_ids(&self) -> Vec<TermId> {
        let mut ids = vec![self.verb];
        for filler in self.args.values() {
            match filler {
                Filler::Word(id) => ids.push(*id),
                Filler::Predicate(inner) => ids.extend(inner.term_ids()),
            }
        }
        ids
    }
}
