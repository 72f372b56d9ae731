//! Storage contract for terms, network nodes and facts
//!
//! The core never touches a concrete database. Everything it persists goes
//! through [`Storage`], and every mutation happens inside a [`Transaction`]
//! that is committed explicitly and rolled back when dropped.

pub mod memory;

pub use memory::MemoryStorage;

use crate::network::{Discriminant, Fact, FactId, FactNode, NodeId};
use crate::paths::Path;
use crate::{Predicate, Term, TermDraft, TermId, TermsResult};
use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

/// Operations the knowledge store needs from a backend.
///
/// Reads take `&self`; a shared borrow is a consistent snapshot of the last
/// committed state. Writes take `&mut self` and must only be issued between
/// `begin` and `commit`/`rollback`.
pub trait Storage {
    /// Open a transaction. Fails with `StorageConflict` if one is already open.
    fn begin(&mut self) -> TermsResult<()>;

    fn commit(&mut self) -> TermsResult<()>;

    /// Discard every change made since `begin`
    fn rollback(&mut self) -> TermsResult<()>;

    /// Ids of all stored terms named `name`. More than one means a corrupted store.
    fn terms_named(&self, name: &str) -> Vec<TermId>;

    fn term(&self, id: TermId) -> Option<Term>;

    fn term_count(&self) -> usize;

    /// Store a new term together with the ids it is a subtype of.
    /// The backend adds the reflexive entry itself.
    fn insert_term(&mut self, draft: TermDraft, ancestors: BTreeSet<TermId>) -> TermsResult<Term>;

    /// Every term `id` is a subtype of, `id` included
    fn ancestors(&self, id: TermId) -> BTreeSet<TermId>;

    /// Closure lookup: does `id` have `ancestor` among its bases/types, transitively?
    fn is_ancestor(&self, id: TermId, ancestor: TermId) -> bool;

    /// Every term that has `id` as an ancestor, `id` included
    fn descendants(&self, id: TermId) -> BTreeSet<TermId>;

    fn root_node(&self) -> Option<NodeId>;

    fn insert_root(&mut self) -> TermsResult<NodeId>;

    fn node(&self, id: NodeId) -> Option<FactNode>;

    fn node_count(&self) -> usize;

    fn node_child(&self, parent: NodeId, discriminant: &Discriminant) -> Option<NodeId>;

    /// Children of `parent` whose discriminant satisfies `filter`, in discriminant order
    fn children_matching(
        &self,
        parent: NodeId,
        filter: &dyn Fn(&Discriminant) -> bool,
    ) -> Vec<FactNode>;

    /// Create a child. Fails with `StorageConflict` if `parent` already has
    /// a child with this discriminant.
    fn insert_node(&mut self, parent: NodeId, discriminant: Discriminant) -> TermsResult<NodeId>;

    /// Record the path the children of `node` test. Only the first call has an effect.
    fn set_child_path(&mut self, node: NodeId, path: Path) -> TermsResult<()>;

    /// Attach a fact to `node` unless it already has one; returns the fact
    /// now attached and whether it was created by this call.
    fn attach_terminal(&mut self, node: NodeId, predicate: Predicate) -> TermsResult<(FactId, bool)>;

    fn fact(&self, id: FactId) -> Option<Fact>;

    fn facts(&self) -> Vec<Fact>;
}

/// Scoped write access to a backend.
///
/// Dereferences to the storage itself. Dropping a transaction that was not
/// committed rolls it back.
pub struct Transaction<'s, S: Storage> {
    storage: &'s mut S,
    finished: bool,
}

impl<'s, S: Storage> Transaction<'s, S> {
    pub fn begin(storage: &'s mut S) -> TermsResult<Self> {
        storage.begin()?;
        Ok(Self {
            storage,
            finished: false,
        })
    }

    pub fn commit(mut self) -> TermsResult<()> {
        self.finished = true;
        self.storage.commit()
    }

    pub fn rollback(mut self) -> TermsResult<()> {
        self.finished = true;
        self.storage.rollback()
    }
}

impl<S: Storage> Deref for Transaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.storage
    }
}

impl<S: Storage> DerefMut for Transaction<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.storage
    }
}

impl<S: Storage> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!("rolling back uncommitted transaction");
        if let Err(err) = self.storage.rollback() {
            tracing::error!(error = %err, "rollback failed");
        }
    }
}
