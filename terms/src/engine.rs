use crate::matching::{MatchEngine, Solution};
use crate::network::{Assertion, Fact, Network};
use crate::response::{render_predicate, Response};
use crate::storage::{MemoryStorage, Storage, Transaction};
use crate::{Predicate, ResourceLimits, Slot, Term, TermId, TermStore, TermsResult};
use std::collections::BTreeSet;
use tracing::debug;

/// The knowledge store.
///
/// Owns one storage backend together with the term registry and the
/// discrimination network built on it. Every mutation runs in its own
/// transaction, so a failed call leaves nothing behind. Reads borrow the
/// store immutably and can run from many threads at once.
pub struct KnowledgeBase<S: Storage = MemoryStorage> {
    storage: S,
    terms: TermStore,
    network: Network,
    limits: ResourceLimits,
}

impl KnowledgeBase<MemoryStorage> {
    pub fn new() -> TermsResult<Self> {
        Self::open(MemoryStorage::new(), ResourceLimits::default())
    }

    /// Create an in-memory store with custom resource limits
    pub fn with_limits(limits: ResourceLimits) -> TermsResult<Self> {
        Self::open(MemoryStorage::new(), limits)
    }
}

impl<S: Storage> KnowledgeBase<S> {
    /// Open a store over `storage`, bootstrapping the root terms and the
    /// network root if the backend is empty.
    pub fn open(mut storage: S, limits: ResourceLimits) -> TermsResult<Self> {
        let mut terms = TermStore::new();
        let mut txn = Transaction::begin(&mut storage)?;
        terms.bootstrap(&mut txn)?;
        let network = Network::initialize(&mut txn)?;
        txn.commit()?;

        Ok(Self {
            storage,
            terms,
            network,
            limits,
        })
    }

    /// Get the current resource limits
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give the backend back, e.g. to reopen it later with [`KnowledgeBase::open`]
    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn terms(&self) -> &TermStore {
        &self.terms
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn lookup(&self, name: &str) -> TermsResult<Term> {
        self.terms.lookup(&self.storage, name)
    }

    pub fn term(&self, id: TermId) -> TermsResult<Term> {
        self.terms.term(&self.storage, id)
    }

    /// Define `name` as an instance of `word_type`.
    ///
    /// `slots` pairs labels with the names of their constraining types.
    pub fn define_word(
        &mut self,
        name: &str,
        word_type: &str,
        slots: &[(&str, &str)],
    ) -> TermsResult<Term> {
        let word_type = self.lookup(word_type)?.id;
        let slots = self.resolve_slots(slots)?;
        self.write(|txn, terms, _, _| terms.define_word(txn, name, word_type, &slots))
    }

    /// Define `name` as a subtype of every term in `supers`
    pub fn define_subword(
        &mut self,
        name: &str,
        supers: &[&str],
        slots: &[(&str, &str)],
    ) -> TermsResult<Term> {
        let supers = supers
            .iter()
            .map(|base| self.lookup(base).map(|term| term.id))
            .collect::<TermsResult<Vec<_>>>()?;
        let slots = self.resolve_slots(slots)?;
        self.write(|txn, terms, _, _| terms.define_subword(txn, name, &supers, &slots))
    }

    /// Look a word up, creating it when the name follows the instance
    /// naming convention (`person1`).
    pub fn instance(&mut self, name: &str) -> TermsResult<Term> {
        self.write(|txn, terms, _, _| terms.lookup_or_instantiate(txn, name))
    }

    pub fn is_subtype(&self, a: &str, b: &str) -> TermsResult<bool> {
        let a = self.lookup(a)?.id;
        let b = self.lookup(b)?.id;
        self.terms.is_subtype(&self.storage, a, b)
    }

    pub fn subtree(&self, root: &str) -> TermsResult<BTreeSet<TermId>> {
        let root = self.lookup(root)?.id;
        self.terms.subtree(&self.storage, root)
    }

    /// Build a flat predicate from term names
    pub fn predicate(&self, verb: &str, args: &[(&str, &str)]) -> TermsResult<Predicate> {
        let mut pred = Predicate::new(self.lookup(verb)?.id);
        for (label, filler) in args {
            pred = pred.with(*label, self.lookup(filler)?.id);
        }
        Ok(pred)
    }

    /// Index a ground fact. Asserting a fact twice stores it once.
    pub fn add_fact(&mut self, fact: &Predicate) -> TermsResult<Assertion> {
        self.write(|txn, terms, network, limits| network.add_fact(txn, terms, limits, fact))
    }

    /// Every consistent binding of the variables in `patterns`
    pub fn query(&self, patterns: &[Predicate]) -> TermsResult<Vec<Solution>> {
        MatchEngine::new(&self.storage, &self.terms, &self.network, &self.limits).query(patterns)
    }

    /// Run a query and resolve its solutions to names
    pub fn respond(&self, patterns: &[Predicate]) -> TermsResult<Response> {
        let solutions = self.query(patterns)?;
        Response::build(&self.storage, &self.terms, patterns, &solutions)
    }

    pub fn facts(&self) -> Vec<Fact> {
        self.storage.facts()
    }

    /// Facts stored at or below the network root, in index order
    pub fn indexed_facts(&self) -> TermsResult<Vec<Fact>> {
        self.network.facts_under(&self.storage, self.network.root())
    }

    /// Render a predicate as `verb(label: filler, ...)`
    pub fn describe(&self, pred: &Predicate) -> TermsResult<String> {
        render_predicate(&self.storage, &self.terms, pred)
    }

    fn resolve_slots(&self, slots: &[(&str, &str)]) -> TermsResult<Vec<Slot>> {
        slots
            .iter()
            .map(|(label, constraint)| Ok(Slot::new(*label, self.lookup(constraint)?.id)))
            .collect()
    }

    /// Run `op` in a fresh transaction, committing only if it succeeds
    fn write<T>(
        &mut self,
        op: impl FnOnce(&mut Transaction<'_, S>, &TermStore, &Network, &ResourceLimits) -> TermsResult<T>,
    ) -> TermsResult<T> {
        let mut txn = Transaction::begin(&mut self.storage)?;
        match op(&mut txn, &self.terms, &self.network, &self.limits) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "discarding failed write");
                txn.rollback()?;
                Err(err)
            }
        }
    }
}
