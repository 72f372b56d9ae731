use crate::matching::{merge_submatches, Bindings, Match};
use crate::network::FactId;
use crate::{ResourceLimits, TermId, TermsError};

fn row(fact: usize, bindings: &[(&str, usize)]) -> Match {
    Match {
        paths: Default::default(),
        bindings: bindings
            .iter()
            .map(|(name, id)| (name.to_string(), TermId(*id)))
            .collect::<Bindings>(),
        fact: Some(FactId(fact)),
    }
}

#[test]
fn test_no_sets_no_solutions() {
    let solutions = merge_submatches(&[], &ResourceLimits::default()).unwrap();
    assert!(solutions.is_empty());
}

#[test]
fn test_single_set_passes_through() {
    let sets = vec![vec![row(0, &[("X", 1)]), row(1, &[("X", 2)])]];
    let solutions = merge_submatches(&sets, &ResourceLimits::default()).unwrap();

    assert_eq!(solutions.len(), 2);
    assert_eq!(solutions[0].get("X"), Some(TermId(1)));
    assert_eq!(solutions[0].facts, vec![FactId(0)]);
    assert_eq!(solutions[1].get("X"), Some(TermId(2)));
}

#[test]
fn test_join_on_shared_variable() {
    let sets = vec![
        vec![row(0, &[("X", 1), ("Y", 2)]), row(1, &[("X", 2), ("Y", 3)])],
        vec![row(2, &[("Y", 2), ("Z", 5)]), row(3, &[("Y", 9), ("Z", 6)])],
    ];
    let solutions = merge_submatches(&sets, &ResourceLimits::default()).unwrap();

    assert_eq!(solutions.len(), 1);
    let solution = &solutions[0];
    assert_eq!(solution.get("X"), Some(TermId(1)));
    assert_eq!(solution.get("Y"), Some(TermId(2)));
    assert_eq!(solution.get("Z"), Some(TermId(5)));
    assert_eq!(solution.facts, vec![FactId(0), FactId(2)]);
}

#[test]
fn test_disjoint_variables_form_a_product() {
    let sets = vec![
        vec![row(0, &[("X", 1)]), row(1, &[("X", 2)])],
        vec![row(2, &[("Y", 3)]), row(3, &[("Y", 4)]), row(4, &[("Y", 5)])],
    ];
    let solutions = merge_submatches(&sets, &ResourceLimits::default()).unwrap();
    assert_eq!(solutions.len(), 6);
}

#[test]
fn test_empty_set_empties_the_join() {
    let sets = vec![vec![row(0, &[("X", 1)])], vec![]];
    let solutions = merge_submatches(&sets, &ResourceLimits::default()).unwrap();
    assert!(solutions.is_empty());
}

#[test]
fn test_solution_limit() {
    let limits = ResourceLimits {
        max_solutions: 3,
        ..ResourceLimits::default()
    };
    let sets = vec![
        vec![row(0, &[("X", 1)]), row(1, &[("X", 2)])],
        vec![row(2, &[("Y", 3)]), row(3, &[("Y", 4)])],
    ];
    let result = merge_submatches(&sets, &limits);
    assert!(matches!(
        result,
        Err(TermsError::ResourceLimitExceeded { ref limit_name, .. }) if limit_name == "max_solutions"
    ));
}

#[test]
fn test_solution_limit_applies_to_a_single_set() {
    let limits = ResourceLimits {
        max_solutions: 2,
        ..ResourceLimits::default()
    };
    let sets = vec![vec![row(0, &[("X", 1)]), row(1, &[("X", 2)]), row(2, &[("X", 3)])]];
    match merge_submatches(&sets, &limits) {
        Err(TermsError::ResourceLimitExceeded {
            limit_name,
            actual_value,
            ..
        }) => {
            assert_eq!(limit_name, "max_solutions");
            assert_eq!(actual_value, "3");
        }
        other => panic!("expected the solution limit, got {:?}", other),
    }

    // Exactly at the limit is fine
    let limits = ResourceLimits {
        max_solutions: 3,
        ..limits
    };
    assert_eq!(merge_submatches(&sets, &limits).unwrap().len(), 3);
}
