//! In-memory storage backend
//!
//! Keeps everything in vectors indexed by id. Writes are journaled while a
//! transaction is open so that `rollback` can restore the state seen at
//! `begin`. Since the store is append-only, the journal only needs the
//! lengths at `begin` plus the few in-place changes made to older nodes.

use super::Storage;
use crate::network::{Discriminant, Fact, FactId, FactNode, NodeId};
use crate::paths::Path;
use crate::{Predicate, Term, TermDraft, TermId, TermsError, TermsResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
struct NodeRecord {
    node: FactNode,
    children: BTreeMap<Discriminant, NodeId>,
}

#[derive(Debug, Clone)]
enum Change {
    ChildPath(NodeId),
    Child { parent: NodeId, discriminant: Discriminant },
    Terminal(NodeId),
}

#[derive(Debug, Clone)]
struct Journal {
    terms: usize,
    nodes: usize,
    facts: usize,
    root: Option<NodeId>,
    changes: Vec<Change>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    terms: Vec<Term>,
    names: HashMap<String, Vec<TermId>>,
    ancestors: Vec<BTreeSet<TermId>>,
    descendants: Vec<BTreeSet<TermId>>,
    nodes: Vec<NodeRecord>,
    root: Option<NodeId>,
    facts: Vec<Fact>,
    journal: Option<Journal>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    fn journal(&mut self) -> TermsResult<&mut Journal> {
        self.journal
            .as_mut()
            .ok_or_else(|| TermsError::Engine("write outside of a transaction".to_string()))
    }

    fn record(&mut self, id: NodeId) -> TermsResult<&mut NodeRecord> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| TermsError::StorageIntegrity(format!("network node {} is missing", id.0)))
    }

    fn undo(&mut self, change: Change) {
        match change {
            Change::ChildPath(id) => {
                if let Some(record) = self.nodes.get_mut(id.0) {
                    record.node.child_path = None;
                }
            }
            Change::Child {
                parent,
                discriminant,
            } => {
                if let Some(record) = self.nodes.get_mut(parent.0) {
                    record.children.remove(&discriminant);
                }
            }
            Change::Terminal(id) => {
                if let Some(record) = self.nodes.get_mut(id.0) {
                    record.node.terminal = None;
                }
            }
        }
    }

    fn forget_terms_from(&mut self, first: usize) {
        for term in self.terms.drain(first..) {
            if let Some(ids) = self.names.get_mut(&term.name) {
                ids.retain(|id| *id != term.id);
                if ids.is_empty() {
                    self.names.remove(&term.name);
                }
            }
            if let Some(ancestors) = self.ancestors.get(term.id.0) {
                for ancestor in ancestors {
                    if let Some(down) = self.descendants.get_mut(ancestor.0) {
                        down.remove(&term.id);
                    }
                }
            }
        }
        self.ancestors.truncate(first);
        self.descendants.truncate(first);
    }
}

impl Storage for MemoryStorage {
    fn begin(&mut self) -> TermsResult<()> {
        if self.journal.is_some() {
            return Err(TermsError::StorageConflict(
                "a transaction is already open".to_string(),
            ));
        }
        self.journal = Some(Journal {
            terms: self.terms.len(),
            nodes: self.nodes.len(),
            facts: self.facts.len(),
            root: self.root,
            changes: Vec::new(),
        });
        Ok(())
    }

    fn commit(&mut self) -> TermsResult<()> {
        self.journal
            .take()
            .map(|_| ())
            .ok_or_else(|| TermsError::Engine("commit without an open transaction".to_string()))
    }

    fn rollback(&mut self) -> TermsResult<()> {
        let journal = self
            .journal
            .take()
            .ok_or_else(|| TermsError::Engine("rollback without an open transaction".to_string()))?;

        for change in journal.changes.into_iter().rev() {
            self.undo(change);
        }
        self.forget_terms_from(journal.terms);
        self.nodes.truncate(journal.nodes);
        self.facts.truncate(journal.facts);
        self.root = journal.root;
        Ok(())
    }

    fn terms_named(&self, name: &str) -> Vec<TermId> {
        self.names.get(name).cloned().unwrap_or_default()
    }

    fn term(&self, id: TermId) -> Option<Term> {
        self.terms.get(id.0).cloned()
    }

    fn term_count(&self) -> usize {
        self.terms.len()
    }

    fn insert_term(&mut self, draft: TermDraft, ancestors: BTreeSet<TermId>) -> TermsResult<Term> {
        self.journal()?;
        let id = TermId(self.terms.len());
        if let Some(missing) = ancestors.iter().find(|a| a.0 >= self.terms.len()) {
            return Err(TermsError::StorageIntegrity(format!(
                "ancestor {} of '{}' does not exist",
                missing, draft.name
            )));
        }

        let term = draft.into_term(id);
        for ancestor in &ancestors {
            self.descendants[ancestor.0].insert(id);
        }
        let mut closure = ancestors;
        closure.insert(id);
        self.ancestors.push(closure);
        self.descendants.push(BTreeSet::from([id]));
        self.names.entry(term.name.clone()).or_default().push(id);
        self.terms.push(term.clone());
        Ok(term)
    }

    fn ancestors(&self, id: TermId) -> BTreeSet<TermId> {
        self.ancestors.get(id.0).cloned().unwrap_or_default()
    }

    fn is_ancestor(&self, id: TermId, ancestor: TermId) -> bool {
        self.ancestors
            .get(id.0)
            .is_some_and(|closure| closure.contains(&ancestor))
    }

    fn descendants(&self, id: TermId) -> BTreeSet<TermId> {
        self.descendants.get(id.0).cloned().unwrap_or_default()
    }

    fn root_node(&self) -> Option<NodeId> {
        self.root
    }

    fn insert_root(&mut self) -> TermsResult<NodeId> {
        self.journal()?;
        if self.root.is_some() {
            return Err(TermsError::StorageConflict(
                "the network root already exists".to_string(),
            ));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord {
            node: FactNode {
                id,
                parent: None,
                discriminant: Discriminant::Root,
                child_path: None,
                terminal: None,
            },
            children: BTreeMap::new(),
        });
        self.root = Some(id);
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Option<FactNode> {
        self.nodes.get(id.0).map(|record| record.node.clone())
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_child(&self, parent: NodeId, discriminant: &Discriminant) -> Option<NodeId> {
        self.nodes
            .get(parent.0)
            .and_then(|record| record.children.get(discriminant).copied())
    }

    fn children_matching(
        &self,
        parent: NodeId,
        filter: &dyn Fn(&Discriminant) -> bool,
    ) -> Vec<FactNode> {
        let Some(record) = self.nodes.get(parent.0) else {
            return Vec::new();
        };
        record
            .children
            .iter()
            .filter(|(discriminant, _)| filter(discriminant))
            .filter_map(|(_, id)| self.nodes.get(id.0))
            .map(|child| child.node.clone())
            .collect()
    }

    fn insert_node(&mut self, parent: NodeId, discriminant: Discriminant) -> TermsResult<NodeId> {
        self.journal()?;
        let id = NodeId(self.nodes.len());
        let record = self.record(parent)?;
        if record.children.contains_key(&discriminant) {
            return Err(TermsError::StorageConflict(format!(
                "node {} already has a child for {:?}",
                parent.0, discriminant
            )));
        }
        record.children.insert(discriminant.clone(), id);
        self.nodes.push(NodeRecord {
            node: FactNode {
                id,
                parent: Some(parent),
                discriminant: discriminant.clone(),
                child_path: None,
                terminal: None,
            },
            children: BTreeMap::new(),
        });
        self.journal()?.changes.push(Change::Child {
            parent,
            discriminant,
        });
        Ok(id)
    }

    fn set_child_path(&mut self, node: NodeId, path: Path) -> TermsResult<()> {
        self.journal()?;
        let record = self.record(node)?;
        if record.node.child_path.is_some() {
            return Ok(());
        }
        record.node.child_path = Some(path);
        self.journal()?.changes.push(Change::ChildPath(node));
        Ok(())
    }

    fn attach_terminal(&mut self, node: NodeId, predicate: Predicate) -> TermsResult<(FactId, bool)> {
        self.journal()?;
        let fact_id = FactId(self.facts.len());
        let record = self.record(node)?;
        if let Some(existing) = record.node.terminal {
            return Ok((existing, false));
        }
        record.node.terminal = Some(fact_id);
        self.facts.push(Fact {
            id: fact_id,
            node,
            predicate,
        });
        self.journal()?.changes.push(Change::Terminal(node));
        Ok((fact_id, true))
    }

    fn fact(&self, id: FactId) -> Option<Fact> {
        self.facts.get(id.0).cloned()
    }

    fn facts(&self) -> Vec<Fact> {
        self.facts.clone()
    }
}
