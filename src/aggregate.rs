//! Source scores from target scores.
//!
//! Each retained interaction row contributes its target's score to its
//! source. Rows are not deduplicated: an unaggregated table counts a target
//! once per row, while the builder's filtered table already carries one row
//! per pair with the pair weight.

use std::collections::HashMap;

use log::{debug, trace};

use crate::adjacency::FilteredInteraction;
use crate::scores::ScoreTable;

#[derive(Default, Clone, Copy)]
struct Accumulator {
    sum: f64,
    mass: f64,
}

/// Mean (or weight-weighted mean) target score per source, highest first.
///
/// Interactions whose target has no score are skipped; sources left without
/// contributions (or with zero total weight) are omitted. Equal scores keep the
/// order in which sources first appear in `filtered`.
pub fn aggregate_source_scores(
    filtered: &[FilteredInteraction],
    target_scores: &ScoreTable,
    weighted: bool,
) -> ScoreTable {
    let lookup: HashMap<&str, f64> = target_scores.iter().collect();

    let mut order: Vec<&str> = Vec::new();
    let mut acc: HashMap<&str, Accumulator> = HashMap::new();
    let mut skipped = 0usize;

    for row in filtered {
        let Some(&score) = lookup.get(row.target.as_str()) else {
            skipped += 1;
            continue;
        };
        let w = if weighted { row.weight } else { 1.0 };
        let entry = acc.entry(row.source.as_str()).or_insert_with(|| {
            order.push(row.source.as_str());
            Accumulator::default()
        });
        entry.sum += score * w;
        entry.mass += w;
    }
    if skipped > 0 {
        debug!("{} interactions had no target score and were skipped", skipped);
    }

    let mut table = ScoreTable {
        entries: order
            .into_iter()
            .filter_map(|source| {
                let a = acc[source];
                (a.mass > 0.0).then(|| (source.to_string(), a.sum / a.mass))
            })
            .collect(),
    };
    table.sort_descending();
    trace!("Aggregated source scores: {:?}", table.entries);
    table
}
