//! Discrimination network over asserted facts
//!
//! Facts are indexed by walking their paths from a single root: each node
//! tests one feature (negation, verb, slot label or slot value) and branches
//! on the value found. Structurally identical facts share every node, and a
//! fact is stored once, as the terminal of the last node on its walk.

use crate::paths::{locate, Located, Path, PathIndexer, PathTest};
use crate::storage::{Storage, Transaction};
use crate::{Filler, Predicate, ResourceLimits, TermId, TermKind, TermStore, TermsError, TermsResult};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FactId(pub usize);

/// The five kinds of network node
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Root,
    Negation,
    Value,
    Verb,
    Label,
}

impl NodeCategory {
    pub fn for_test(test: PathTest) -> Self {
        match test {
            PathTest::Verb => NodeCategory::Verb,
            PathTest::Negation => NodeCategory::Negation,
            PathTest::Label => NodeCategory::Label,
            PathTest::Value => NodeCategory::Value,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeCategory::Root => "root",
            NodeCategory::Negation => "negation",
            NodeCategory::Value => "value",
            NodeCategory::Verb => "verb",
            NodeCategory::Label => "label",
        }
    }
}

/// The value a node was reached by. Children of one node are keyed by it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "category", content = "value", rename_all = "snake_case")]
pub enum Discriminant {
    Root,
    Negation(bool),
    Verb(TermId),
    Value(TermId),
    Label(String),
}

impl Discriminant {
    pub fn category(&self) -> NodeCategory {
        match self {
            Discriminant::Root => NodeCategory::Root,
            Discriminant::Negation(_) => NodeCategory::Negation,
            Discriminant::Verb(_) => NodeCategory::Verb,
            Discriminant::Value(_) => NodeCategory::Value,
            Discriminant::Label(_) => NodeCategory::Label,
        }
    }

    /// The term carried by verb and value discriminants
    pub fn term(&self) -> Option<TermId> {
        match self {
            Discriminant::Verb(id) | Discriminant::Value(id) => Some(*id),
            _ => None,
        }
    }

    /// Wrap a term in the discriminant for a verb or value test
    pub fn for_term(category: NodeCategory, id: TermId) -> Option<Self> {
        match category {
            NodeCategory::Verb => Some(Discriminant::Verb(id)),
            NodeCategory::Value => Some(Discriminant::Value(id)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FactNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub discriminant: Discriminant,
    /// The path every child of this node tests. Set with the first child.
    pub child_path: Option<Path>,
    pub terminal: Option<FactId>,
}

/// A fact stored as the terminal of a network node
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub id: FactId,
    pub node: NodeId,
    pub predicate: Predicate,
}

/// Outcome of asserting a fact
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Assertion {
    pub fact: FactId,
    /// False when an identical fact was already indexed
    pub created: bool,
}

/// Handle on the network rooted in a storage backend
#[derive(Debug, Clone)]
pub struct Network {
    root: NodeId,
}

impl Network {
    /// Load the root node, creating it on an empty store
    pub fn initialize<S: Storage>(txn: &mut Transaction<'_, S>) -> TermsResult<Self> {
        let root = match txn.root_node() {
            Some(root) => root,
            None => {
                debug!("creating network root");
                txn.insert_root()?
            }
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Index a ground fact.
    ///
    /// Runs inside the caller's transaction. On error the caller drops the
    /// transaction, which discards any node created before the failure.
    pub fn add_fact<S: Storage>(
        &self,
        txn: &mut Transaction<'_, S>,
        terms: &TermStore,
        limits: &ResourceLimits,
        pred: &Predicate,
    ) -> TermsResult<Assertion> {
        validate_fact(&**txn, terms, pred)?;
        let paths = PathIndexer::new(&**txn, terms, limits).paths(pred)?;

        let mut current = self.root;
        for path in &paths {
            let node = load_node(&**txn, current)?;
            if node.terminal.is_some() && node.child_path.is_none() {
                return Err(shape_conflict("end of fact", &path.to_string()));
            }
            if let Some(existing) = &node.child_path {
                if existing != path {
                    return Err(shape_conflict(&existing.to_string(), &path.to_string()));
                }
            }

            let discriminant = ground_discriminant(pred, path)?;
            current = match txn.node_child(current, &discriminant) {
                Some(child) => child,
                None => {
                    let child = txn.insert_node(current, discriminant)?;
                    if node.child_path.is_none() {
                        txn.set_child_path(current, path.clone())?;
                    }
                    child
                }
            };
        }

        let last = load_node(&**txn, current)?;
        if let Some(existing) = &last.child_path {
            return Err(shape_conflict(&existing.to_string(), "end of fact"));
        }

        let (fact, created) = txn.attach_terminal(current, pred.clone())?;
        debug!(fact = fact.0, node = current.0, created, "indexed fact");
        Ok(Assertion { fact, created })
    }

    /// All facts stored at or below `node`
    pub fn facts_under<S: Storage>(&self, storage: &S, node: NodeId) -> TermsResult<Vec<Fact>> {
        let mut facts = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let current = load_node(storage, id)?;
            if let Some(fact_id) = current.terminal {
                let fact = storage.fact(fact_id).ok_or_else(|| {
                    TermsError::StorageIntegrity(format!("node {} points at missing fact {}", id.0, fact_id.0))
                })?;
                facts.push(fact);
            }
            let children = storage.children_matching(id, &|_| true);
            // Reverse so the stack pops children in discriminant order
            stack.extend(children.iter().rev().map(|child| child.id));
        }
        Ok(facts)
    }
}

pub(crate) fn load_node<S: Storage>(storage: &S, id: NodeId) -> TermsResult<FactNode> {
    storage
        .node(id)
        .ok_or_else(|| TermsError::StorageIntegrity(format!("network node {} is missing", id.0)))
}

fn shape_conflict(existing: &str, requested: &str) -> TermsError {
    warn!(existing, requested, "fact shape conflicts with the network");
    TermsError::ShapeConflict {
        existing: existing.to_string(),
        requested: requested.to_string(),
    }
}

/// The discriminant a ground fact presents at `path`
fn ground_discriminant(pred: &Predicate, path: &Path) -> TermsResult<Discriminant> {
    let test = path
        .test()
        .ok_or_else(|| TermsError::Engine(format!("path '{}' has no test segment", path)))?;
    let unreachable = || TermsError::Engine(format!("fact has no feature at path '{}'", path));

    match test {
        PathTest::Label => path
            .label()
            .map(|label| Discriminant::Label(label.to_string()))
            .ok_or_else(unreachable),
        PathTest::Negation => match locate(pred, path.prefix()) {
            Located::Predicate(p) => Ok(Discriminant::Negation(p.negated)),
            _ => Err(unreachable()),
        },
        PathTest::Verb => match locate(pred, path.prefix()) {
            Located::Predicate(p) => Ok(Discriminant::Verb(p.verb)),
            _ => Err(unreachable()),
        },
        PathTest::Value => match locate(pred, path.prefix()) {
            Located::Term(id) => Ok(Discriminant::Value(id)),
            _ => Err(unreachable()),
        },
    }
}

/// Check a fact against the declaration of its verb, recursively
fn validate_fact<S: Storage>(storage: &S, terms: &TermStore, pred: &Predicate) -> TermsResult<()> {
    let verb = terms.term(storage, pred.verb)?;
    if verb.is_variable {
        return Err(TermsError::InvalidFact(format!(
            "verb '{}' is a variable; facts must be ground",
            verb.name
        )));
    }
    if verb.kind != TermKind::Verb {
        return Err(TermsError::InvalidFact(format!(
            "'{}' is a {}, not a verb",
            verb.name,
            verb.kind.name()
        )));
    }

    for slot in &verb.slots {
        if !pred.args.contains_key(&slot.label) {
            return Err(TermsError::InvalidFact(format!(
                "'{}' requires a value for slot '{}'",
                verb.name, slot.label
            )));
        }
    }

    for (label, filler) in &pred.args {
        let slot = verb.slot(label).ok_or_else(|| {
            TermsError::InvalidFact(format!("'{}' has no slot named '{}'", verb.name, label))
        })?;
        let filler_id = match filler {
            Filler::Word(id) => {
                let term = terms.term(storage, *id)?;
                if term.is_variable {
                    return Err(TermsError::InvalidFact(format!(
                        "slot '{}' holds variable '{}'; facts must be ground",
                        label, term.name
                    )));
                }
                *id
            }
            Filler::Predicate(inner) => {
                validate_fact(storage, terms, inner)?;
                inner.verb
            }
        };
        if !terms.is_subtype(storage, filler_id, slot.constraint)? {
            let filler_name = terms.term(storage, filler_id)?.name;
            let constraint_name = terms.term(storage, slot.constraint)?.name;
            return Err(TermsError::InvalidFact(format!(
                "slot '{}' of '{}' expects a {}, got '{}'",
                label, verb.name, constraint_name, filler_name
            )));
        }
    }
    Ok(())
}
