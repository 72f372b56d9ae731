//! # Terms
//!
//! **A smart knowledge store**
//!
//! Terms keeps a hierarchy of named types and a store of facts built from
//! them, and answers conjunctive queries with variables against those facts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terms::{KnowledgeBase, TermsResult};
//!
//! fn main() -> TermsResult<()> {
//!     let mut kb = KnowledgeBase::new()?;
//!
//!     // Vocabulary
//!     kb.define_word("person", "noun", &[])?;
//!     kb.define_word("likes", "verb", &[("object", "person")])?;
//!     kb.define_word("alice", "person", &[])?;
//!     kb.define_word("bob", "person", &[])?;
//!
//!     // Facts
//!     let fact = kb.predicate("likes", &[("subject", "alice"), ("object", "bob")])?;
//!     kb.add_fact(&fact)?;
//!
//!     // Who likes bob?
//!     kb.define_word("X", "person", &[])?;
//!     let pattern = kb.predicate("likes", &[("subject", "X"), ("object", "bob")])?;
//!     let response = kb.respond(&[pattern])?;
//!     println!("{}", response.to_json()?);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Terms
//! Every name is a term with a kind (word, noun, verb or predicate
//! instance), a type it is an instance of, and bases it specializes. Names
//! starting with an uppercase letter are variables.
//!
//! ### Facts
//! A fact is a ground predicate: a verb with every slot filled by a word or
//! by another predicate. Facts are indexed in a discrimination network, so
//! identical facts are stored once and similar facts share structure.
//!
//! ### Queries
//! A query is a list of patterns. Variables range over the subtypes of their
//! type, and a variable shared between patterns must bind the same term in
//! all of them.

pub mod engine;
pub mod error;
pub mod lexicon;
pub mod matching;
pub mod network;
pub mod paths;
pub mod resource_limits;
pub mod response;
pub mod storage;
pub mod term;

pub use engine::KnowledgeBase;
pub use error::TermsError;
pub use lexicon::{Roots, TermStore};
pub use matching::{merge_submatches, Bindings, Match, MatchEngine, Solution};
pub use network::{Assertion, Discriminant, Fact, FactId, FactNode, Network, NodeCategory, NodeId};
pub use paths::{Path, PathIndexer, PathTest};
pub use resource_limits::ResourceLimits;
pub use response::{render_predicate, Response, SolutionRecord};
pub use storage::{MemoryStorage, Storage, Transaction};
pub use term::{is_variable_name, Filler, Predicate, Slot, Term, TermDraft, TermId, TermKind};

/// Result type for Terms operations
pub type TermsResult<T> = Result<T, TermsError>;

#[cfg(test)]
mod tests;
