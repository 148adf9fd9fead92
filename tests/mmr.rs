use proptest::prelude::*;
use quizgen::{
    error::SelectError,
    nlp::mmr::{select, MmrConfig},
};

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn config(top_n: usize, diversity: f32) -> MmrConfig {
    MmrConfig { top_n, diversity }
}

/// Unit vectors with sim(A,T)=0.9, sim(B,T)=0.85, sim(A,B)=0.99,
/// sim(C,T)=0.5 and sim(A,C)=0.1.
fn near_duplicate_fixture() -> (Vec<f32>, Vec<Vec<f32>>) {
    let target = vec![1.0, 0.0, 0.0];
    let a_y = (1.0f32 - 0.81).sqrt();
    let a = vec![0.9, a_y, 0.0];
    let b_y = (0.99 - 0.9 * 0.85) / a_y;
    let b = vec![0.85, b_y, (1.0 - 0.85f32 * 0.85 - b_y * b_y).sqrt()];
    let c_y = (0.1 - 0.9 * 0.5) / a_y;
    let c = vec![0.5, c_y, (1.0 - 0.25 - c_y * c_y).sqrt()];
    (target, vec![a, b, c])
}

#[test]
fn near_duplicate_is_suppressed() {
    let (target, candidates) = near_duplicate_fixture();
    let picked = select(&target, &candidates, &labels(&["A", "B", "C"]), &config(2, 0.9)).unwrap();
    let names: Vec<&str> = picked.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
    assert!((picked[0].relevance - 0.9).abs() < 1e-3);
    assert!((picked[1].relevance - 0.5).abs() < 1e-3);
}

#[test]
fn zero_diversity_ranks_by_relevance() {
    let (target, candidates) = near_duplicate_fixture();
    let picked = select(&target, &candidates, &labels(&["A", "B", "C"]), &config(3, 0.0)).unwrap();
    let names: Vec<&str> = picked.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn single_candidate_is_returned_alone() {
    let target = vec![0.3, 0.7];
    for diversity in [0.0, 0.5, 1.0] {
        let picked = select(&target, &[vec![1.0, 0.0]], &labels(&["only"]), &config(4, diversity))
            .unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].label, "only");
    }
}

#[test]
fn top_n_is_clamped_to_pool() {
    let (target, candidates) = near_duplicate_fixture();
    let picked = select(&target, &candidates, &labels(&["A", "B", "C"]), &config(10, 0.5)).unwrap();
    assert_eq!(picked.len(), 3);
}

#[test]
fn empty_pool_is_rejected() {
    let err = select(&[1.0, 0.0], &[], &[], &config(4, 0.9)).unwrap_err();
    assert!(matches!(err, SelectError::InvalidInput(_)));
}

#[test]
fn malformed_inputs_are_rejected() {
    let target = vec![1.0, 0.0];
    let mismatched = select(&target, &[vec![1.0, 0.0, 0.0]], &labels(&["x"]), &config(1, 0.5));
    assert!(mismatched.is_err());

    let misaligned = select(&target, &[vec![1.0, 0.0]], &labels(&["x", "y"]), &config(1, 0.5));
    assert!(misaligned.is_err());

    let non_finite = select(&target, &[vec![f32::NAN, 0.0]], &labels(&["x"]), &config(1, 0.5));
    assert!(non_finite.is_err());

    let duplicate = select(
        &target,
        &[vec![1.0, 0.0], vec![0.0, 1.0]],
        &labels(&["x", "x"]),
        &config(2, 0.5),
    );
    assert!(duplicate.is_err());

    let out_of_range = select(&target, &[vec![1.0, 0.0]], &labels(&["x"]), &config(1, 1.5));
    assert!(out_of_range.is_err());

    let zero_top_n = select(&target, &[vec![1.0, 0.0]], &labels(&["x"]), &config(0, 0.5));
    assert!(zero_top_n.is_err());
}

#[test]
fn ties_resolve_to_first_candidate() {
    let target = vec![1.0, 0.0];
    let candidates = vec![vec![0.0, 1.0], vec![2.0, 0.0], vec![1.0, 0.0]];
    let picked = select(&target, &candidates, &labels(&["x", "first", "second"]), &config(1, 0.0))
        .unwrap();
    assert_eq!(picked[0].label, "first");
}

#[test]
fn inputs_are_untouched() {
    let (target, candidates) = near_duplicate_fixture();
    let before = candidates.clone();
    select(&target, &candidates, &labels(&["A", "B", "C"]), &config(2, 0.9)).unwrap();
    assert_eq!(candidates, before);
}

fn pool() -> impl Strategy<Value = (Vec<f32>, Vec<Vec<f32>>)> {
    (2usize..6).prop_flat_map(|dim| {
        (
            prop::collection::vec(-1.0f32..1.0, dim),
            prop::collection::vec(prop::collection::vec(-1.0f32..1.0, dim), 1..12),
        )
    })
}

proptest! {
    #[test]
    fn selection_shape_holds((target, candidates) in pool(), top_n in 1usize..8, diversity in 0.0f32..=1.0) {
        let names: Vec<String> = (0..candidates.len()).map(|i| format!("c{i}")).collect();
        let cfg = config(top_n, diversity);
        let picked = select(&target, &candidates, &names, &cfg).unwrap();

        prop_assert_eq!(picked.len(), top_n.min(candidates.len()));
        let mut seen = std::collections::HashSet::new();
        for item in &picked {
            prop_assert!(seen.insert(item.label.clone()));
            prop_assert!((-1.0..=1.0).contains(&item.relevance));
            let scaled = item.relevance * 10_000.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-6);
        }

        let again = select(&target, &candidates, &names, &cfg).unwrap();
        prop_assert_eq!(picked, again);
    }

    #[test]
    fn zero_diversity_is_non_increasing((target, candidates) in pool(), top_n in 1usize..8) {
        let names: Vec<String> = (0..candidates.len()).map(|i| format!("c{i}")).collect();
        let picked = select(&target, &candidates, &names, &config(top_n, 0.0)).unwrap();
        for pair in picked.windows(2) {
            prop_assert!(pair[0].relevance >= pair[1].relevance);
        }
    }
}
