use consistent_rank::{
    find_ranking_tolerant, PairRelation, PreconditionViolation, RankingError, DEFAULT_EQUAL_WIDTH,
};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn midpoint_pair_ties_for_any_width() {
    for width in [0.0, 0.05, DEFAULT_EQUAL_WIDTH, 1.0] {
        let ranking = find_ranking_tolerant([(("a", "b"), 0.5)], width, None).unwrap();
        assert_eq!(ranking.ranks[0], ranking.ranks[1], "width {width}");
        assert_eq!(ranking.pairs[0].relation, PairRelation::Equal);
        assert!(approx_eq(ranking.total_cost, 0.0, 1e-6));
    }
}

#[test]
fn tie_group_shares_rank_above_a_loser() {
    // a = b, both clearly beat c.
    let ranking = find_ranking_tolerant(
        [(("a", "b"), 0.52), (("a", "c"), 0.95), (("b", "c"), 0.9)],
        DEFAULT_EQUAL_WIDTH,
        None,
    )
    .unwrap();

    assert!(approx_eq(ranking.total_cost, 0.0, 1e-6));
    assert_eq!(ranking.ranks, vec![1.0, 1.0, 0.0]);
}

#[test]
fn consistent_strict_chain_matches_basic_semantics() {
    let ranking = find_ranking_tolerant(
        [(("a", "b"), 0.0), (("b", "c"), 0.0), (("a", "c"), 0.1)],
        DEFAULT_EQUAL_WIDTH,
        None,
    )
    .unwrap();
    assert!(approx_eq(ranking.total_cost, 0.0, 1e-6));
    assert_eq!(ranking.ranks, vec![0.0, 1.0, 2.0]);
}

#[test]
fn symmetric_inputs_agree() {
    let raw = [("p", "q", 0.45), ("q", "r", 0.9), ("r", "p", 0.2), ("r", "s", 0.75)];
    let forward =
        find_ranking_tolerant(raw.iter().map(|&(a, b, v)| ((a, b), v)), 0.2, None).unwrap();
    let backward =
        find_ranking_tolerant(raw.iter().map(|&(a, b, v)| ((b, a), 1.0 - v)), 0.2, None).unwrap();
    assert_eq!(forward.ranks, backward.ranks);
    assert!(approx_eq(forward.total_cost, backward.total_cost, 1e-6));
}

#[test]
fn smaller_max_rank_never_lowers_cost_and_adds_ties() {
    // A clean four-step chain needs a rank span of 3.
    let raw = [(("a", "b"), 0.8), (("b", "c"), 0.8), (("c", "d"), 0.8)];
    let roomy = find_ranking_tolerant(raw, 0.2, None).unwrap();
    let tight = find_ranking_tolerant(raw, 0.2, Some(1)).unwrap();

    assert!(approx_eq(roomy.total_cost, 0.0, 1e-6));
    assert!(tight.total_cost >= roomy.total_cost - 1e-9);

    let ties = |r: &consistent_rank::Ranking<&str>| {
        r.pairs
            .iter()
            .filter(|p| p.relation == PairRelation::Equal)
            .count()
    };
    assert!(ties(&tight) > ties(&roomy));
    // Everything collapses into one tie group.
    assert!(tight.ranks.iter().all(|&r| r == tight.ranks[0]));
}

#[test]
fn equal_relations_in_the_result_have_equal_ranks() {
    let ranking = find_ranking_tolerant(
        [
            (("a", "b"), 0.5),
            (("b", "c"), 0.58),
            (("c", "d"), 0.95),
            (("a", "d"), 0.9),
            (("d", "e"), 0.45),
        ],
        0.2,
        None,
    )
    .unwrap();

    for pair in &ranking.pairs {
        let ra = ranking.rank_of(&pair.a).unwrap();
        let rb = ranking.rank_of(&pair.b).unwrap();
        match pair.relation {
            PairRelation::Equal => assert_eq!(ra, rb),
            PairRelation::Greater => assert!(ra >= rb + 1.0 - 1e-6),
            PairRelation::Less => assert!(rb >= ra + 1.0 - 1e-6),
        }
    }
}

#[test]
fn width_outside_unit_interval_is_rejected() {
    for width in [-0.1, 1.5, f64::NAN] {
        let err = find_ranking_tolerant([(("a", "b"), 0.5)], width, None).unwrap_err();
        assert!(matches!(
            err,
            RankingError::Precondition(PreconditionViolation::EqualWidthOutOfRange { .. })
        ));
    }
}
