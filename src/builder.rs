use std::collections::{HashMap, HashSet};

use crate::adjacency::{
    Adjacency, AdjacencyMatrix, FilteredInteraction, SourceSummary, TargetSummary,
};
use crate::errors::{IdeologyError, Result};
use crate::records::{is_weighted, Interaction};

use log::{debug, info, trace};

pub const DEFAULT_MIN_SOURCES: usize = 2;

/// Insertion-ordered grouping: keys in first-seen order plus an index map.
struct Ordered<'a, V> {
    keys: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
    values: Vec<V>,
}

impl<'a, V: Default> Ordered<'a, V> {
    fn new() -> Self {
        Self {
            keys: Vec::new(),
            index: HashMap::new(),
            values: Vec::new(),
        }
    }

    fn entry(&mut self, key: &'a str) -> &mut V {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                self.keys.push(key);
                self.values.push(V::default());
                self.index.insert(key, self.keys.len() - 1);
                self.keys.len() - 1
            }
        };
        &mut self.values[idx]
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.values[idx])
    }

    fn iter(&self) -> impl Iterator<Item = (&'a str, &V)> + '_ {
        self.keys.iter().copied().zip(self.values.iter())
    }
}

/// Distinct members of a group, first-seen order kept.
#[derive(Default)]
struct DistinctSet<'a> {
    order: Vec<&'a str>,
    seen: HashSet<&'a str>,
}

impl<'a> DistinctSet<'a> {
    fn insert(&mut self, key: &'a str) {
        if self.seen.insert(key) {
            self.order.push(key);
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Configures the filtering thresholds and turns an interaction table into
/// a dense [`AdjacencyMatrix`].
///
/// Filtering runs in a fixed order: `drop` list, total-interaction cap `k`,
/// distinct-source floor `n`, top-`m` sources, then weight aggregation.
///
/// ```
/// use ideospace::builder::AdjacencyBuilder;
/// use ideospace::records::Interaction;
///
/// let records = vec![
///     Interaction::new("a", "x"), Interaction::new("a", "y"),
///     Interaction::new("b", "x"), Interaction::new("b", "y"),
///     Interaction::new("c", "x"),
/// ];
/// let adj = AdjacencyBuilder::new().with_min_sources(2).build(&records).unwrap();
/// assert_eq!(adj.matrix.targets, vec!["a", "b"]);
/// assert_eq!(adj.matrix.shape(), (2, 2));
/// ```
#[derive(Clone, Debug)]
pub struct AdjacencyBuilder {
    // Thresholds
    max_sources: Option<usize>,      // m
    min_sources: usize,              // n
    max_interactions: Option<usize>, // k
    drop: HashSet<String>,

    // Optional outputs
    filtered_table: bool,
    summaries: bool,
}

impl Default for AdjacencyBuilder {
    fn default() -> Self {
        debug!("Creating AdjacencyBuilder with default parameters");
        Self {
            max_sources: None,
            min_sources: DEFAULT_MIN_SOURCES,
            max_interactions: None,
            drop: HashSet::new(),
            filtered_table: false,
            summaries: false,
        }
    }
}

impl AdjacencyBuilder {
    pub fn new() -> Self {
        info!("Initializing new AdjacencyBuilder");
        Self::default()
    }

    // -------------------- Thresholds --------------------

    /// Keep only the `m` sources with the most distinct targets.
    pub fn with_max_sources(mut self, m: usize) -> Self {
        info!("Capping retained sources at m={}", m);
        self.max_sources = Some(m);
        self
    }

    /// Minimum number of distinct sources a target needs to be kept.
    pub fn with_min_sources(mut self, n: usize) -> Self {
        info!("Requiring n={} distinct sources per target", n);
        self.min_sources = n;
        self
    }

    /// Targets whose total interaction count reaches `k` are dropped.
    pub fn with_max_interactions(mut self, k: usize) -> Self {
        info!("Dropping targets with k>={} interactions", k);
        self.max_interactions = Some(k);
        self
    }

    /// Identifiers (targets or sources) removed before any threshold.
    pub fn with_drop<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop.extend(ids.into_iter().map(Into::into));
        info!("Drop list now holds {} identifiers", self.drop.len());
        self
    }

    // -------------------- Outputs --------------------

    pub fn with_filtered_table(mut self, keep: bool) -> Self {
        self.filtered_table = keep;
        self
    }

    pub fn with_summaries(mut self, keep: bool) -> Self {
        self.summaries = keep;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_sources < 1 {
            return Err(IdeologyError::invalid("n", "must be at least 1"));
        }
        if self.max_sources == Some(0) {
            return Err(IdeologyError::invalid("m", "must be at least 1"));
        }
        if self.max_interactions == Some(0) {
            return Err(IdeologyError::invalid("k", "must be at least 1"));
        }
        Ok(())
    }

    // -------------------- Build --------------------

    /// Filter `records` and assemble the adjacency matrix.
    ///
    /// The input slice is only read; every intermediate set borrows from it.
    pub fn build(&self, records: &[Interaction]) -> Result<Adjacency> {
        self.validate()?;
        let weighted = is_weighted(records)?;

        info!(
            "Building adjacency from {} records (weighted={})",
            records.len(),
            weighted
        );
        debug!(
            "Build configuration: m={:?}, n={}, k={:?}, drop={}",
            self.max_sources,
            self.min_sources,
            self.max_interactions,
            self.drop.len()
        );

        // 1) Drop list; zero-weight rows are not interactions
        let kept: Vec<&Interaction> = records
            .iter()
            .filter(|r| r.mass() > 0.0)
            .filter(|r| !self.drop.contains(&r.target) && !self.drop.contains(&r.source))
            .collect();
        debug!("After drop list: {} records", kept.len());
        non_empty(&kept, "target", "drop list")?;

        // 2) Total interactions per target must stay below k
        let kept: Vec<&Interaction> = match self.max_interactions {
            Some(k) => {
                let mut totals: Ordered<f64> = Ordered::new();
                for r in &kept {
                    *totals.entry(&r.target) += r.mass();
                }
                let cap = k as f64;
                kept.into_iter()
                    .filter(|r| totals.get(&r.target).is_some_and(|&t| t < cap))
                    .collect()
            }
            None => kept,
        };
        debug!("After k threshold: {} records", kept.len());
        non_empty(&kept, "target", "k threshold")?;

        // 3) Distinct sources per target must reach n
        let mut target_sources: Ordered<DistinctSet> = Ordered::new();
        for r in &kept {
            target_sources.entry(&r.target).insert(&r.source);
        }
        let kept: Vec<&Interaction> = kept
            .into_iter()
            .filter(|r| {
                target_sources
                    .get(&r.target)
                    .is_some_and(|s| s.len() >= self.min_sources)
            })
            .collect();
        debug!("After n threshold: {} records", kept.len());
        non_empty(&kept, "target", "n threshold")?;

        let target_summary = self.summaries.then(|| summarize_targets(&kept));

        // 4) Top-m sources by distinct target count
        let kept: Vec<&Interaction> = match self.max_sources {
            Some(m) => {
                let mut source_targets: Ordered<DistinctSet> = Ordered::new();
                for r in &kept {
                    source_targets.entry(&r.source).insert(&r.target);
                }
                let mut ranked: Vec<(&str, usize)> = source_targets
                    .iter()
                    .map(|(s, t)| (s, t.len()))
                    .collect();
                // stable: equal counts keep first-seen order
                ranked.sort_by(|a, b| b.1.cmp(&a.1));
                let top: HashSet<&str> = ranked.iter().take(m).map(|(s, _)| *s).collect();
                trace!("Top-{} sources: {:?}", m, &ranked[..ranked.len().min(m)]);
                kept.into_iter()
                    .filter(|r| top.contains(r.source.as_str()))
                    .collect()
            }
            None => kept,
        };
        debug!("After m threshold: {} records", kept.len());
        non_empty(&kept, "source", "m threshold")?;

        // 5) Aggregate weights per (target, source), first-seen pair order
        let mut pair_index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut pairs: Vec<(&str, &str, f64)> = Vec::new();
        for r in &kept {
            let key = (r.target.as_str(), r.source.as_str());
            match pair_index.get(&key) {
                Some(&idx) => pairs[idx].2 += r.mass(),
                None => {
                    pair_index.insert(key, pairs.len());
                    pairs.push((key.0, key.1, r.mass()));
                }
            }
        }

        // 6) Dense assembly
        let mut rows: Ordered<()> = Ordered::new();
        let mut cols: Ordered<()> = Ordered::new();
        for r in &kept {
            rows.entry(&r.target);
            cols.entry(&r.source);
        }
        let triplets: Vec<(usize, usize, f64)> = pairs
            .iter()
            .map(|&(t, s, w)| (rows.index[t], cols.index[s], w))
            .collect();

        let matrix = AdjacencyMatrix::from_triplets(
            rows.keys.iter().map(|s| s.to_string()).collect(),
            cols.keys.iter().map(|s| s.to_string()).collect(),
            &triplets,
        );

        info!(
            "Adjacency matrix assembled: {} targets x {} sources, {} non-zero cells",
            matrix.targets.len(),
            matrix.sources.len(),
            pairs.len()
        );

        let source_summary = self.summaries.then(|| summarize_sources(&kept));
        let filtered = self.filtered_table.then(|| {
            pairs
                .iter()
                .map(|&(t, s, w)| FilteredInteraction {
                    target: t.to_string(),
                    source: s.to_string(),
                    weight: w,
                })
                .collect()
        });

        Ok(Adjacency {
            matrix,
            filtered,
            target_summary,
            source_summary,
        })
    }
}

/// Free-function form of [`AdjacencyBuilder::build`] that always returns the
/// filtered table and, if asked, the summaries.
pub fn build_adjacency(
    records: &[Interaction],
    m: Option<usize>,
    n: usize,
    k: Option<usize>,
    drop: &[String],
    summaries: bool,
) -> Result<Adjacency> {
    let mut builder = AdjacencyBuilder::new()
        .with_min_sources(n)
        .with_drop(drop.iter().cloned())
        .with_filtered_table(true)
        .with_summaries(summaries);
    if let Some(m) = m {
        builder = builder.with_max_sources(m);
    }
    if let Some(k) = k {
        builder = builder.with_max_interactions(k);
    }
    builder.build(records)
}

fn non_empty(records: &[&Interaction], entity: &'static str, stage: &'static str) -> Result<()> {
    if records.is_empty() {
        return Err(IdeologyError::EmptyResult { entity, stage });
    }
    Ok(())
}

fn summarize_targets(records: &[&Interaction]) -> Vec<(String, TargetSummary)> {
    let mut groups: Ordered<(DistinctSet, f64)> = Ordered::new();
    for r in records {
        let (sources, total) = groups.entry(&r.target);
        sources.insert(&r.source);
        *total += r.mass();
    }
    groups
        .iter()
        .map(|(t, (sources, total))| {
            (
                t.to_string(),
                TargetSummary {
                    sources: sources.order.iter().map(|s| s.to_string()).collect(),
                    distinct_sources: sources.len(),
                    total_interactions: *total,
                },
            )
        })
        .collect()
}

fn summarize_sources(records: &[&Interaction]) -> Vec<(String, SourceSummary)> {
    let mut groups: Ordered<DistinctSet> = Ordered::new();
    for r in records {
        groups.entry(&r.source).insert(&r.target);
    }
    groups
        .iter()
        .map(|(s, targets)| {
            (
                s.to_string(),
                SourceSummary {
                    targets: targets.order.iter().map(|t| t.to_string()).collect(),
                    distinct_targets: targets.len(),
                },
            )
        })
        .collect()
}
