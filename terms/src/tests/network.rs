use super::{likes, vocabulary};
use crate::network::Discriminant;
use crate::storage::Storage;
use crate::{Path, Predicate, TermsError};

#[test]
fn test_add_fact_builds_a_chain() {
    let mut kb = vocabulary();
    let before = kb.storage().node_count();
    let assertion = kb.add_fact(&likes(&kb, "alice", "bob")).unwrap();

    assert!(assertion.created);
    // One node per path
    assert_eq!(kb.storage().node_count(), before + 6);

    let root = kb.storage().node(kb.network().root()).unwrap();
    assert_eq!(root.discriminant, Discriminant::Root);
    assert_eq!(root.child_path, Some(Path::parse("_verb")));

    let fact = kb.storage().fact(assertion.fact).unwrap();
    let terminal = kb.storage().node(fact.node).unwrap();
    assert_eq!(terminal.terminal, Some(assertion.fact));
    assert_eq!(
        terminal.discriminant,
        Discriminant::Value(kb.lookup("alice").unwrap().id)
    );
    assert_eq!(terminal.child_path, None);
}

#[test]
fn test_add_fact_is_idempotent() {
    let mut kb = vocabulary();
    let fact = likes(&kb, "alice", "bob");

    let first = kb.add_fact(&fact).unwrap();
    let nodes = kb.storage().node_count();
    let second = kb.add_fact(&fact).unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.fact, second.fact);
    assert_eq!(kb.storage().node_count(), nodes);
    assert_eq!(kb.facts().len(), 1);
}

#[test]
fn test_similar_facts_share_prefix() {
    let mut kb = vocabulary();
    kb.add_fact(&likes(&kb, "alice", "bob")).unwrap();
    let nodes = kb.storage().node_count();

    // Diverges at subject._term only
    kb.add_fact(&likes(&kb, "carol", "bob")).unwrap();
    assert_eq!(kb.storage().node_count(), nodes + 1);

    // Diverges at object._term: a new value node plus the rest of the chain
    kb.add_fact(&likes(&kb, "alice", "carol")).unwrap();
    assert_eq!(kb.storage().node_count(), nodes + 4);
    assert_eq!(kb.facts().len(), 3);
}

#[test]
fn test_negated_fact_is_distinct() {
    let mut kb = vocabulary();
    let fact = likes(&kb, "alice", "bob");
    let plain = kb.add_fact(&fact).unwrap();
    let negated = kb.add_fact(&fact.clone().negate()).unwrap();

    assert!(negated.created);
    assert_ne!(plain.fact, negated.fact);
}

#[test]
fn test_nested_fact() {
    let mut kb = vocabulary();
    let says = kb.lookup("says").unwrap().id;
    let alice = kb.lookup("alice").unwrap().id;
    let fact = Predicate::new(says)
        .with("subject", alice)
        .with("object", likes(&kb, "bob", "carol"));

    let assertion = kb.add_fact(&fact).unwrap();
    assert!(assertion.created);
    assert_eq!(kb.storage().fact(assertion.fact).unwrap().predicate, fact);
}

#[test]
fn test_fact_missing_slot_is_invalid() {
    let mut kb = vocabulary();
    let fact = kb.predicate("likes", &[("subject", "alice")]).unwrap();
    assert!(matches!(kb.add_fact(&fact), Err(TermsError::InvalidFact(_))));
}

#[test]
fn test_fact_unknown_label_is_invalid() {
    let mut kb = vocabulary();
    let fact = kb
        .predicate(
            "likes",
            &[("subject", "alice"), ("object", "bob"), ("color", "carol")],
        )
        .unwrap();
    assert!(matches!(kb.add_fact(&fact), Err(TermsError::InvalidFact(_))));
}

#[test]
fn test_fact_with_variable_is_invalid() {
    let mut kb = vocabulary();
    let fact = likes(&kb, "X", "bob");
    assert!(matches!(kb.add_fact(&fact), Err(TermsError::InvalidFact(_))));
}

#[test]
fn test_fact_filler_must_fit_constraint() {
    let mut kb = vocabulary();
    let fact = likes(&kb, "alice", "thing");
    assert!(matches!(kb.add_fact(&fact), Err(TermsError::InvalidFact(_))));
}

#[test]
fn test_fact_verb_must_be_a_verb() {
    let mut kb = vocabulary();
    let fact = kb.predicate("alice", &[]).unwrap();
    assert!(matches!(kb.add_fact(&fact), Err(TermsError::InvalidFact(_))));
}

#[test]
fn test_fact_with_unknown_term() {
    let mut kb = vocabulary();
    let fact = Predicate::new(crate::TermId(10_000));
    assert_eq!(
        kb.add_fact(&fact),
        Err(TermsError::TermNotFound("#10000".to_string()))
    );
}

#[test]
fn test_shape_conflict_leaves_store_unchanged() {
    let mut kb = vocabulary();
    kb.add_fact(&likes(&kb, "alice", "bob")).unwrap();
    let nodes = kb.storage().node_count();

    // Same verb and object, but the subject is a whole predicate
    let fact = Predicate::new(kb.lookup("likes").unwrap().id)
        .with("subject", likes(&kb, "bob", "alice"))
        .with("object", kb.lookup("bob").unwrap().id);

    match kb.add_fact(&fact) {
        Err(TermsError::ShapeConflict {
            existing,
            requested,
        }) => {
            assert_eq!(existing, "subject._term");
            assert_eq!(requested, "subject._verb");
        }
        other => panic!("expected shape conflict, got {:?}", other),
    }
    assert_eq!(kb.storage().node_count(), nodes);
    assert_eq!(kb.facts().len(), 1);
    assert!(!kb.storage().in_transaction());
}

#[test]
fn test_facts_under_root() {
    let mut kb = vocabulary();
    kb.add_fact(&likes(&kb, "alice", "bob")).unwrap();
    kb.add_fact(&likes(&kb, "bob", "carol")).unwrap();

    let facts = kb.indexed_facts().unwrap();
    assert_eq!(facts.len(), 2);

    let verb_node = kb
        .storage()
        .node_child(kb.network().root(), &Discriminant::Verb(kb.lookup("likes").unwrap().id))
        .unwrap();
    assert_eq!(kb.network().facts_under(kb.storage(), verb_node).unwrap().len(), 2);
}
