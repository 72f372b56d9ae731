use proptest::prelude::*;
use terms::{KnowledgeBase, Predicate, Storage};

const PEOPLE: [&str; 5] = ["ann", "ben", "cat", "dan", "eve"];

fn community() -> KnowledgeBase {
    let mut kb = KnowledgeBase::new().unwrap();
    kb.define_word("person", "noun", &[]).unwrap();
    kb.define_word("likes", "verb", &[("object", "person")]).unwrap();
    for name in PEOPLE {
        kb.define_word(name, "person", &[]).unwrap();
    }
    kb.define_word("X", "person", &[]).unwrap();
    kb.define_word("Y", "person", &[]).unwrap();
    kb
}

fn likes(kb: &KnowledgeBase, subject: &str, object: &str) -> Predicate {
    kb.predicate("likes", &[("subject", subject), ("object", object)])
        .unwrap()
}

/// Builds a chain of noun types, each a subword of the previous one
fn hierarchy(depth: usize) -> KnowledgeBase {
    let mut kb = KnowledgeBase::new().unwrap();
    kb.define_word("level0", "noun", &[]).unwrap();
    for level in 1..depth {
        let name = format!("level{}", level);
        let base = format!("level{}", level - 1);
        kb.define_subword(&name, &[base.as_str()], &[]).unwrap();
    }
    kb
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_subtype_follows_the_chain(depth in 2usize..8, a in 0usize..8, b in 0usize..8) {
        let a = a % depth;
        let b = b % depth;
        let kb = hierarchy(depth);
        let sub = format!("level{}", a);
        let sup = format!("level{}", b);

        prop_assert!(kb.is_subtype(&sub, &sub).unwrap());
        prop_assert!(kb.is_subtype(&sub, "thing").unwrap());
        prop_assert_eq!(kb.is_subtype(&sub, &sup).unwrap(), a >= b);
    }

    #[test]
    fn prop_asserting_twice_changes_nothing(
        pairs in prop::collection::vec((0usize..5, 0usize..5), 1..12)
    ) {
        let mut kb = community();
        for (s, o) in &pairs {
            kb.add_fact(&likes(&kb, PEOPLE[*s], PEOPLE[*o])).unwrap();
        }
        let facts = kb.facts().len();
        let nodes = kb.storage().node_count();

        for (s, o) in &pairs {
            let assertion = kb.add_fact(&likes(&kb, PEOPLE[*s], PEOPLE[*o])).unwrap();
            prop_assert!(!assertion.created);
        }
        prop_assert_eq!(kb.facts().len(), facts);
        prop_assert_eq!(kb.storage().node_count(), nodes);
    }

    #[test]
    fn prop_query_returns_exactly_the_stored_pairs(
        pairs in prop::collection::btree_set((0usize..5, 0usize..5), 1..12)
    ) {
        let mut kb = community();
        for (s, o) in &pairs {
            kb.add_fact(&likes(&kb, PEOPLE[*s], PEOPLE[*o])).unwrap();
        }

        let response = kb.respond(&[likes(&kb, "X", "Y")]).unwrap();
        let mut found: Vec<(String, String)> = response
            .solutions
            .iter()
            .map(|s| (s.bindings["X"].clone(), s.bindings["Y"].clone()))
            .collect();
        found.sort();
        let mut expected: Vec<(String, String)> = pairs
            .iter()
            .map(|(s, o)| (PEOPLE[*s].to_string(), PEOPLE[*o].to_string()))
            .collect();
        expected.sort();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_query_order_does_not_matter(
        pairs in prop::collection::vec((0usize..5, 0usize..5), 1..12)
    ) {
        let mut forward = community();
        let mut backward = community();
        for (s, o) in &pairs {
            forward.add_fact(&likes(&forward, PEOPLE[*s], PEOPLE[*o])).unwrap();
        }
        for (s, o) in pairs.iter().rev() {
            backward.add_fact(&likes(&backward, PEOPLE[*s], PEOPLE[*o])).unwrap();
        }

        let first = forward.respond(&[likes(&forward, "X", "Y"), likes(&forward, "Y", "X")]).unwrap();
        let second = backward.respond(&[likes(&backward, "X", "Y"), likes(&backward, "Y", "X")]).unwrap();

        let mut a: Vec<_> = first.solutions.iter().map(|s| s.bindings.clone()).collect();
        let mut b: Vec<_> = second.solutions.iter().map(|s| s.bindings.clone()).collect();
        a.sort();
        b.sort();
        prop_assert_eq!(a, b);
    }
}
