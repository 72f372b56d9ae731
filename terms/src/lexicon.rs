//! The term registry: words, their types and the subtype hierarchy
//!
//! Five root terms are created by [`TermStore::bootstrap`]:
//!
//! ```text
//! word                      the root of everything
//! noun   : word  (< word)   instances of noun are noun types
//! verb   : word  (< word)   instances of verb are verb types
//! thing  : noun  (< word)   the default base of new noun types
//! exists : verb  (< word)   the default base of new verb types, slot subject: word
//! ```
//!
//! `a : t` reads "a is an instance of t", `a < b` reads "b is a base of a".
//! Both links count for [`TermStore::is_subtype`].

use crate::storage::{Storage, Transaction};
use crate::term::instance_noun;
use crate::{Slot, Term, TermDraft, TermId, TermKind, TermsError, TermsResult};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Ids of the bootstrapped root terms
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Roots {
    pub word: TermId,
    pub noun: TermId,
    pub verb: TermId,
    pub thing: TermId,
    pub exists: TermId,
}

/// Registry of term definitions over a storage backend.
///
/// Holds no term data itself: names, slots and the subtype closure all live
/// in storage, so they roll back together with the transaction that wrote
/// them.
#[derive(Debug, Clone, Default)]
pub struct TermStore {
    roots: Option<Roots>,
}

impl TermStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root terms, or load them if the store already has them.
    pub fn bootstrap<S: Storage>(&mut self, txn: &mut Transaction<'_, S>) -> TermsResult<Roots> {
        if let Some(roots) = self.roots {
            return Ok(roots);
        }

        let roots = if txn.terms_named("word").is_empty() {
            debug!("bootstrapping root terms");
            let word = insert(txn, draft("word", TermKind::Word, vec![], None, vec![]))?.id;
            let noun = insert(txn, draft("noun", TermKind::Noun, vec![word], Some(word), vec![]))?.id;
            let verb = insert(txn, draft("verb", TermKind::Verb, vec![word], Some(word), vec![]))?.id;
            let thing = insert(txn, draft("thing", TermKind::Noun, vec![word], Some(noun), vec![]))?.id;
            let exists = insert(
                txn,
                draft(
                    "exists",
                    TermKind::Verb,
                    vec![word],
                    Some(verb),
                    vec![Slot::new("subject", word)],
                ),
            )?
            .id;
            Roots {
                word,
                noun,
                verb,
                thing,
                exists,
            }
        } else {
            Roots {
                word: find(&**txn, "word")?.id,
                noun: find(&**txn, "noun")?.id,
                verb: find(&**txn, "verb")?.id,
                thing: find(&**txn, "thing")?.id,
                exists: find(&**txn, "exists")?.id,
            }
        };

        self.roots = Some(roots);
        Ok(roots)
    }

    pub fn roots(&self) -> TermsResult<&Roots> {
        self.roots.as_ref().ok_or(TermsError::NotBootstrapped)
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.roots.is_some()
    }

    pub fn term<S: Storage>(&self, storage: &S, id: TermId) -> TermsResult<Term> {
        self.roots()?;
        storage
            .term(id)
            .ok_or_else(|| TermsError::TermNotFound(id.to_string()))
    }

    pub fn lookup<S: Storage>(&self, storage: &S, name: &str) -> TermsResult<Term> {
        self.roots()?;
        find(storage, name)
    }

    /// Define a new term as an instance of `word_type`.
    ///
    /// The kind of the new term follows from its type: instances of `noun`
    /// are noun types based on `thing`, instances of `verb` are verb types
    /// based on `exists` (inheriting its slots), instances of other nouns
    /// are individual words, and instances of other verbs are predicate
    /// terms.
    pub fn define_word<S: Storage>(
        &self,
        txn: &mut Transaction<'_, S>,
        name: &str,
        word_type: TermId,
        slots: &[Slot],
    ) -> TermsResult<Term> {
        let roots = *self.roots()?;
        self.ensure_new(&**txn, name)?;
        let word_type = self.term(&**txn, word_type)?;

        let (kind, bases) = match word_type.kind {
            TermKind::Noun if self.extends(&**txn, &word_type, roots.noun)? => {
                (TermKind::Noun, vec![roots.thing])
            }
            TermKind::Verb if self.extends(&**txn, &word_type, roots.verb)? => {
                (TermKind::Verb, vec![roots.exists])
            }
            TermKind::Noun => (TermKind::Word, vec![]),
            TermKind::Verb => (TermKind::Exists, vec![]),
            TermKind::Word | TermKind::Exists => {
                return Err(TermsError::InvalidWordType {
                    name: name.to_string(),
                    word_type: word_type.name,
                })
            }
        };

        let slots = self.merge_slots(&**txn, name, &bases, slots)?;
        insert(txn, draft(name, kind, bases, Some(word_type.id), slots))
    }

    /// Define a new term as a subtype of `supers`.
    ///
    /// Kind and type come from the first base. Slots are merged from every
    /// base in order, then `extra_slots` are added.
    pub fn define_subword<S: Storage>(
        &self,
        txn: &mut Transaction<'_, S>,
        name: &str,
        supers: &[TermId],
        extra_slots: &[Slot],
    ) -> TermsResult<Term> {
        self.roots()?;
        self.ensure_new(&**txn, name)?;
        let invalid = |reason: String| TermsError::InvalidBases {
            name: name.to_string(),
            reason,
        };

        let first = match supers.first() {
            Some(id) => self.term(&**txn, *id)?,
            None => return Err(invalid("at least one base is required".to_string())),
        };
        let mut seen = BTreeSet::new();
        for id in supers {
            // Bases must already exist, so a new term can never close a cycle
            let base = self.term(&**txn, *id)?;
            if !seen.insert(*id) {
                return Err(invalid(format!("'{}' is listed twice", base.name)));
            }
            if base.kind != first.kind {
                return Err(invalid(format!(
                    "'{}' is a {} but '{}' is a {}",
                    base.name,
                    base.kind.name(),
                    first.name,
                    first.kind.name()
                )));
            }
        }

        let slots = self.merge_slots(&**txn, name, supers, extra_slots)?;
        insert(
            txn,
            draft(name, first.kind, supers.to_vec(), first.term_type, slots),
        )
    }

    /// Look a word up, defining it on demand when its name follows the
    /// instance convention (`person3` is an instance of `person`).
    /// Only noun types whose instances are individual words qualify.
    pub fn lookup_or_instantiate<S: Storage>(
        &self,
        txn: &mut Transaction<'_, S>,
        name: &str,
    ) -> TermsResult<Term> {
        match self.lookup(&**txn, name) {
            Err(TermsError::TermNotFound(_)) => {
                let roots = *self.roots()?;
                let noun_name =
                    instance_noun(name).ok_or_else(|| TermsError::TermNotFound(name.to_string()))?;
                let noun = self.lookup(&**txn, noun_name)?;
                if noun.kind != TermKind::Noun || self.extends(&**txn, &noun, roots.noun)? {
                    return Err(TermsError::InvalidWordType {
                        name: name.to_string(),
                        word_type: noun.name,
                    });
                }
                self.define_word(txn, name, noun.id, &[])
            }
            found => found,
        }
    }

    /// Reflexive-transitive subtype test over bases and instance-of links
    pub fn is_subtype<S: Storage>(&self, storage: &S, a: TermId, b: TermId) -> TermsResult<bool> {
        self.term(storage, a)?;
        self.term(storage, b)?;
        Ok(storage.is_ancestor(a, b))
    }

    /// Every term that is a subtype of `root`, `root` included
    pub fn subtree<S: Storage>(&self, storage: &S, root: TermId) -> TermsResult<BTreeSet<TermId>> {
        self.term(storage, root)?;
        Ok(storage.descendants(root))
    }

    /// The type a variable ranges over
    pub fn constraint_of(&self, variable: &Term) -> TermsResult<TermId> {
        let roots = self.roots()?;
        Ok(variable.constraint().unwrap_or(roots.word))
    }

    fn ensure_new<S: Storage>(&self, storage: &S, name: &str) -> TermsResult<()> {
        if storage.terms_named(name).is_empty() {
            Ok(())
        } else {
            Err(TermsError::DuplicateTerm(name.to_string()))
        }
    }

    /// Whether `term` is `ancestor` or reaches it through bases alone
    fn extends<S: Storage>(&self, storage: &S, term: &Term, ancestor: TermId) -> TermsResult<bool> {
        if term.id == ancestor {
            return Ok(true);
        }
        for base in &term.bases {
            let base = self.term(storage, *base)?;
            if self.extends(storage, &base, ancestor)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Inherited slots first, in base order, then `extra`.
    ///
    /// A label declared more than once keeps its first position and the most
    /// specific of its constraints. Unrelated constraints are a conflict.
    fn merge_slots<S: Storage>(
        &self,
        storage: &S,
        name: &str,
        bases: &[TermId],
        extra: &[Slot],
    ) -> TermsResult<Vec<Slot>> {
        let mut inherited = Vec::new();
        for base in bases {
            inherited.extend(self.term(storage, *base)?.slots);
        }

        let mut merged: Vec<Slot> = Vec::new();
        for slot in inherited.iter().chain(extra) {
            check_label(&slot.label)?;
            self.term(storage, slot.constraint)?;
            match merged.iter_mut().find(|s| s.label == slot.label) {
                None => merged.push(slot.clone()),
                Some(existing) => {
                    if storage.is_ancestor(slot.constraint, existing.constraint) {
                        existing.constraint = slot.constraint;
                    } else if !storage.is_ancestor(existing.constraint, slot.constraint) {
                        return Err(TermsError::SlotConflict {
                            name: name.to_string(),
                            label: slot.label.clone(),
                            first: self.term(storage, existing.constraint)?.name,
                            second: self.term(storage, slot.constraint)?.name,
                        });
                    }
                }
            }
        }
        Ok(merged)
    }
}

/// Labels become path segments, so they cannot hold the separator or
/// look like a reserved segment
fn check_label(label: &str) -> TermsResult<()> {
    let reason = if label.is_empty() {
        "a slot label cannot be empty"
    } else if label.contains('.') {
        "a slot label cannot contain '.'"
    } else if label.starts_with('_') {
        "a slot label cannot start with '_'"
    } else {
        return Ok(());
    };
    Err(TermsError::UnsupportedSlotType {
        label: label.to_string(),
        reason: reason.to_string(),
    })
}

fn draft(
    name: &str,
    kind: TermKind,
    bases: Vec<TermId>,
    term_type: Option<TermId>,
    slots: Vec<Slot>,
) -> TermDraft {
    TermDraft {
        name: name.to_string(),
        kind,
        bases,
        term_type,
        slots,
    }
}

fn find<S: Storage>(storage: &S, name: &str) -> TermsResult<Term> {
    let ids = storage.terms_named(name);
    match ids.as_slice() {
        [] => Err(TermsError::TermNotFound(name.to_string())),
        [id] => storage.term(*id).ok_or_else(|| {
            TermsError::StorageIntegrity(format!("name index points '{}' at missing term {}", name, id))
        }),
        _ => Err(TermsError::StorageIntegrity(format!(
            "{} terms share the name '{}'",
            ids.len(),
            name
        ))),
    }
}

fn insert<S: Storage>(txn: &mut Transaction<'_, S>, draft: TermDraft) -> TermsResult<Term> {
    let mut ancestors = BTreeSet::new();
    for base in &draft.bases {
        ancestors.extend(txn.ancestors(*base));
    }
    if let Some(term_type) = draft.term_type {
        ancestors.extend(txn.ancestors(term_type));
    }
    let term = txn.insert_term(draft, ancestors)?;
    debug!(term = %term.name, id = term.id.0, kind = term.kind.name(), "defined term");
    Ok(term)
}
