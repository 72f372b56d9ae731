use crate::KnowledgeBase;


// Storage and configuration tests
mod resource_limits;

// Indexing tests
mod network;

// Query tests
mod join;

/// person/likes vocabulary with alice, bob and carol, and no facts
pub(crate) fn vocabulary() -> KnowledgeBase {
    let mut kb = KnowledgeBase::new().unwrap();
    kb.define_word("person", "noun", &[]).unwrap();
    kb.define_word("likes", "verb", &[("object", "person")]).unwrap();
    kb.define_word("says", "verb", &[("object", "exists")]).unwrap();
    for name in ["alice", "bob", "carol"] {
        kb.define_word(name, "person", &[]).unwrap();
    }
    for variable in ["X", "Y", "Z"] {
        kb.define_word(variable, "person", &[]).unwrap();
    }
    kb
}

pub(crate) fn likes(kb: &KnowledgeBase, subject: &str, object: &str) -> crate::Predicate {
    kb.predicate("likes", &[("subject", subject), ("object", object)])
        .unwrap()
}
