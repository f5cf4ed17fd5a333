//! Canonical comparison sets.
//!
//! Every logical pair `{a, b}` is stored once under the key `(min, max)`; a
//! strength given in descending orientation is complemented on the way in.
//! Items are enumerated from the keys and addressed by their index in the
//! sorted node list, so the model builders only ever see `usize` ids.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::PreconditionViolation;

/// Two canonicalized strengths closer than this are treated as the same observation.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

/// What to do when a logical pair is observed more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail with [`PreconditionViolation::ConflictingComparison`] unless the observations agree.
    #[default]
    Reject,
    /// Use the mean of all canonicalized observations.
    Average,
    /// Keep the observation seen last in input order.
    LastWins,
}

/// One canonical observation: `strength` is the probability that node `i` dominates node `j`, `i < j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalPair {
    pub i: usize,
    pub j: usize,
    pub strength: f64,
}

impl CanonicalPair {
    /// Observed at 0 or 1; the error bound alone encodes the absolute value.
    pub fn is_extreme(&self) -> bool {
        self.strength == 0.0 || self.strength == 1.0
    }
}

/// Result of looking up an ordered node pair `(a, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oriented {
    /// Index into [`ComparisonSet::pairs`].
    pub pair: usize,
    /// `true` when the pair is stored as `(b, a)` and relations must be complemented.
    pub flipped: bool,
}

/// Normalized comparisons plus the node universe they span.
#[derive(Debug, Clone)]
pub struct ComparisonSet<N> {
    nodes: Vec<N>,
    pairs: Vec<CanonicalPair>,
    index: HashMap<(usize, usize), usize>,
}

impl<N: Ord + Clone + Debug> ComparisonSet<N> {
    /// Canonicalize raw comparisons.
    ///
    /// Fails before anything else is built if a strength is outside [0, 1] or
    /// not finite, if an item is compared with itself, or if duplicates
    /// disagree under [`DuplicatePolicy::Reject`].
    pub fn normalize<I>(comparisons: I, policy: DuplicatePolicy) -> Result<Self, PreconditionViolation>
    where
        I: IntoIterator<Item = ((N, N), f64)>,
    {
        let mut merged: BTreeMap<(N, N), Merged> = BTreeMap::new();

        for ((a, b), value) in comparisons {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PreconditionViolation::ProbabilityOutOfRange {
                    pair: format!("({a:?}, {b:?})"),
                    value,
                });
            }
            let (key, strength) = match a.cmp(&b) {
                std::cmp::Ordering::Less => ((a, b), value),
                std::cmp::Ordering::Greater => ((b, a), 1.0 - value),
                std::cmp::Ordering::Equal => {
                    return Err(PreconditionViolation::SelfComparison {
                        item: format!("{a:?}"),
                    })
                }
            };

            match merged.get_mut(&key) {
                None => {
                    merged.insert(key, Merged::new(strength));
                }
                Some(entry) => {
                    if policy == DuplicatePolicy::Reject
                        && (entry.last - strength).abs() > DUPLICATE_TOLERANCE
                    {
                        return Err(PreconditionViolation::ConflictingComparison {
                            pair: format!("({:?}, {:?})", key.0, key.1),
                            first: entry.last,
                            second: strength,
                        });
                    }
                    entry.push(strength);
                }
            }
        }

        let nodes: Vec<N> = merged
            .keys()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut pairs = Vec::with_capacity(merged.len());
        let mut index = HashMap::with_capacity(merged.len());
        for ((a, b), entry) in &merged {
            // Both ids come from `nodes`, so the searches cannot miss.
            let (Ok(i), Ok(j)) = (nodes.binary_search(a), nodes.binary_search(b)) else {
                continue;
            };
            index.insert((i, j), pairs.len());
            pairs.push(CanonicalPair {
                i,
                j,
                strength: entry.resolve(policy),
            });
        }

        Ok(Self {
            nodes,
            pairs,
            index,
        })
    }
}

impl<N> ComparisonSet<N> {
    /// Sorted, unique items that appear in at least one comparison.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Canonical pairs, sorted by `(i, j)`.
    pub fn pairs(&self) -> &[CanonicalPair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Locate the stored pair for the ordered node pair `(a, b)`.
    ///
    /// This is the only place that knows which orientation is stored; callers
    /// complement whatever relation they read when `flipped` is set.
    pub fn orient(&self, a: usize, b: usize) -> Option<Oriented> {
        if a < b {
            self.index
                .get(&(a, b))
                .map(|&pair| Oriented { pair, flipped: false })
        } else {
            self.index
                .get(&(b, a))
                .map(|&pair| Oriented { pair, flipped: true })
        }
    }

    /// Every triangle `(i, j, k)` whose legs `(i, j)`, `(j, k)` and `(i, k)` are all observed,
    /// with `(i, j)` a canonical pair and `k` any third node.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.pairs.iter().enumerate().flat_map(move |(first, pair)| {
            (0..self.nodes.len()).filter_map(move |k| {
                let second = self.orient(pair.j, k)?;
                let closing = self.orient(pair.i, k)?;
                Some(Triangle {
                    first,
                    second,
                    closing,
                })
            })
        })
    }
}

/// Legs of a triangle `i -> j -> k` with the closing edge `i -> k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// Canonical pair `(i, j)`; never flipped.
    pub first: usize,
    pub second: Oriented,
    pub closing: Oriented,
}

#[derive(Debug)]
struct Merged {
    sum: f64,
    count: usize,
    last: f64,
}

impl Merged {
    fn new(strength: f64) -> Self {
        Self {
            sum: strength,
            count: 1,
            last: strength,
        }
    }

    fn push(&mut self, strength: f64) {
        self.sum += strength;
        self.count += 1;
        self.last = strength;
    }

    fn resolve(&self, policy: DuplicatePolicy) -> f64 {
        match policy {
            DuplicatePolicy::Average => (self.sum / self.count as f64).clamp(0.0, 1.0),
            DuplicatePolicy::Reject | DuplicatePolicy::LastWins => self.last,
        }
    }
}
