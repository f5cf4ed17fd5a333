//! Public ranking entry points.
//!
//! Every call builds its own models from scratch: normalize, solve the
//! consistency model, then extract minimal ranks from the resolved relations.
//! Nothing is cached between calls, so independent calls can run in parallel.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::comparisons::{ComparisonSet, DuplicatePolicy};
use crate::consistency::{
    self, ConsistencyOutcome, DecisionRule, PairRelation, CORRECTION_TOLERANCE,
};
use crate::error::{PreconditionViolation, RankingError};
use crate::extract::minimal_ranks;

/// Default tie band width for the tolerant variant.
pub const DEFAULT_EQUAL_WIDTH: f64 = 0.2;

// =============================================================================
// Config
// =============================================================================

/// Settings for the tolerant variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TolerantConfig {
    /// Width of the tie band centred on 0.5, in [0, 1]. Corrected strengths
    /// within `0.5 ± equal_width / 2` resolve to "equal".
    pub equal_width: f64,
    /// Upper bound of the rank surrogate. `None` uses the node count. Smaller
    /// values leave less room for strict chains and so produce more ties.
    pub max_rank: Option<usize>,
}

impl Default for TolerantConfig {
    fn default() -> Self {
        Self {
            equal_width: DEFAULT_EQUAL_WIDTH,
            max_rank: None,
        }
    }
}

impl TolerantConfig {
    fn validate(&self) -> Result<(), PreconditionViolation> {
        if !self.equal_width.is_finite() || !(0.0..=1.0).contains(&self.equal_width) {
            return Err(PreconditionViolation::EqualWidthOutOfRange {
                equal_width: self.equal_width,
            });
        }
        if self.max_rank == Some(0) {
            return Err(PreconditionViolation::ZeroMaxRank);
        }
        Ok(())
    }
}

/// Which consistency model to solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    /// Every pair resolves to greater or less.
    #[default]
    Basic,
    /// Pairs may also resolve to equal.
    Tolerant(TolerantConfig),
}

impl Variant {
    fn rule(&self) -> DecisionRule {
        match self {
            Variant::Basic => DecisionRule::Midpoint,
            Variant::Tolerant(cfg) => DecisionRule::band(cfg.equal_width),
        }
    }
}

/// Full configuration of a ranking call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub variant: Variant,
    pub duplicates: DuplicatePolicy,
}

// =============================================================================
// Result
// =============================================================================

/// How one compared pair was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResolution<N> {
    pub a: N,
    pub b: N,
    /// Canonical observed probability that `a` dominates `b`.
    pub observed: f64,
    pub relation: PairRelation,
    /// Smallest change to `observed` compatible with `relation`.
    pub correction: f64,
}

impl<N> PairResolution<N> {
    /// The resolved relation contradicts the observation.
    pub fn is_flipped(&self) -> bool {
        self.correction > CORRECTION_TOLERANCE
    }
}

/// Result of a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking<N> {
    /// Every compared item, sorted.
    pub nodes: Vec<N>,
    /// Rank per node, aligned with `nodes`. Higher dominates; ties share a value.
    pub ranks: Vec<f64>,
    /// Total L1 correction needed to make the comparisons consistent.
    pub total_cost: f64,
    /// Resolution of every canonical pair, sorted by `(a, b)`.
    pub pairs: Vec<PairResolution<N>>,
}

impl<N> Ranking<N> {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            ranks: Vec::new(),
            total_cost: 0.0,
            pairs: Vec::new(),
        }
    }

    /// Rank of `node`, if it was compared at all.
    pub fn rank_of(&self, node: &N) -> Option<f64>
    where
        N: Ord,
    {
        self.nodes
            .binary_search(node)
            .ok()
            .map(|idx| self.ranks[idx])
    }

    /// Pairs whose resolved relation needed a correction.
    pub fn flipped(&self) -> impl Iterator<Item = &PairResolution<N>> {
        self.pairs.iter().filter(|p| p.is_flipped())
    }

    /// Nodes ordered from the highest rank down; ties keep node order.
    pub fn ordered(&self) -> Vec<(&N, f64)> {
        let mut out: Vec<(&N, f64)> = self.nodes.iter().zip(self.ranks.iter().copied()).collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }

    /// The two-part result `(ranks, total_cost)`.
    pub fn into_parts(self) -> (Vec<f64>, f64) {
        (self.ranks, self.total_cost)
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Basic variant: every compared pair resolves to a strict relation.
///
/// Keys are unordered pairs `(a, b)` with the probability that `a` dominates
/// `b`; `(b, a)` with `1 - p` means the same thing.
pub fn find_ranking<N, I>(comparisons: I) -> Result<Ranking<N>, RankingError>
where
    N: Ord + Clone + Debug,
    I: IntoIterator<Item = ((N, N), f64)>,
{
    rank_with_config(comparisons, &RankingConfig::default())
}

/// Tolerant variant with an explicit tie band and optional rank bound.
pub fn find_ranking_tolerant<N, I>(
    comparisons: I,
    equal_width: f64,
    max_rank: Option<usize>,
) -> Result<Ranking<N>, RankingError>
where
    N: Ord + Clone + Debug,
    I: IntoIterator<Item = ((N, N), f64)>,
{
    let config = RankingConfig {
        variant: Variant::Tolerant(TolerantConfig {
            equal_width,
            max_rank,
        }),
        ..RankingConfig::default()
    };
    rank_with_config(comparisons, &config)
}

/// Rank under an explicit configuration.
pub fn rank_with_config<N, I>(comparisons: I, config: &RankingConfig) -> Result<Ranking<N>, RankingError>
where
    N: Ord + Clone + Debug,
    I: IntoIterator<Item = ((N, N), f64)>,
{
    if let Variant::Tolerant(cfg) = &config.variant {
        cfg.validate()?;
    }

    let set = ComparisonSet::normalize(comparisons, config.duplicates)?;
    if set.is_empty() {
        return Ok(Ranking::empty());
    }
    debug!(
        nodes = set.node_count(),
        pairs = set.pairs().len(),
        triangles = set.triangles().count(),
        "normalized comparisons"
    );

    let outcome = match &config.variant {
        Variant::Basic => consistency::basic::solve(&set)?,
        Variant::Tolerant(cfg) => {
            let max_rank = cfg.max_rank.unwrap_or(set.node_count());
            consistency::tolerant::solve(&set, cfg.equal_width, max_rank)?
        }
    };

    let ranks = minimal_ranks(set.node_count(), &outcome.relations)?;
    Ok(assemble(&set, &outcome, ranks, config.variant.rule()))
}

fn assemble<N: Clone>(
    set: &ComparisonSet<N>,
    outcome: &ConsistencyOutcome,
    ranks: Vec<f64>,
    rule: DecisionRule,
) -> Ranking<N> {
    let nodes = set.nodes();
    let pairs = set
        .pairs()
        .iter()
        .zip(&outcome.relations)
        .map(|(pair, resolved)| PairResolution {
            a: nodes[pair.i].clone(),
            b: nodes[pair.j].clone(),
            observed: pair.strength,
            relation: resolved.relation,
            correction: rule.correction(pair.strength, resolved.relation),
        })
        .collect();

    Ranking {
        nodes: nodes.to_vec(),
        ranks,
        total_cost: outcome.total_cost,
        pairs,
    }
}
