//! End-to-end entry points.
//!
//! - [`run_full_pipeline`]: filter → adjacency → target scores → source scores
//!   as the mean of their targets' scores.
//! - [`run_simplified`]: target and source scores both straight from
//!   correspondence analysis of an adjacency matrix and its transpose.
//!
//! [`PipelineParams`] is plain serde data so the caller can keep it in a
//! JSON file next to the interaction dump:
//!
//! ```
//! use ideospace::pipeline::PipelineParams;
//!
//! let params = PipelineParams::from_json(r#"{"min_sources": 3, "max_sources": 50}"#).unwrap();
//! assert_eq!(params.min_sources, 3);
//! assert_eq!(params.max_sources, Some(50));
//! assert_eq!(params.dimensions, 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::adjacency::{AdjacencyMatrix, SourceSummary, TargetSummary};
use crate::aggregate::aggregate_source_scores;
use crate::builder::{AdjacencyBuilder, DEFAULT_MIN_SOURCES};
use crate::errors::{IdeologyError, Result};
use crate::records::{require_weights, Interaction};
use crate::scores::{CorrespondenceAnalysis, ScoreTable};
use crate::svd::SvdMethod;

use log::{debug, info};

fn default_min_sources() -> usize {
    DEFAULT_MIN_SOURCES
}

fn default_dimensions() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// m: keep the top-m sources by distinct targets.
    #[serde(default)]
    pub max_sources: Option<usize>,
    /// n: minimum distinct sources per target.
    #[serde(default = "default_min_sources")]
    pub min_sources: usize,
    /// k: targets with this many interactions or more are dropped.
    #[serde(default)]
    pub max_interactions: Option<usize>,
    #[serde(default)]
    pub drop: Vec<String>,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Weighted mean for source scores; requires weighted records.
    #[serde(default)]
    pub weighted: bool,
    #[serde(default)]
    pub summaries: bool,
    #[serde(default)]
    pub svd: SvdMethod,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            max_sources: None,
            min_sources: DEFAULT_MIN_SOURCES,
            max_interactions: None,
            drop: Vec::new(),
            dimensions: default_dimensions(),
            weighted: false,
            summaries: false,
            svd: SvdMethod::default(),
        }
    }
}

impl PipelineParams {
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Thresholds are checked by the builder; only `dimensions` is checked here.
    pub fn validate(&self) -> Result<()> {
        self.builder().validate()?;
        if self.dimensions < 1 {
            return Err(IdeologyError::invalid("dimensions", "must be at least 1"));
        }
        Ok(())
    }

    fn builder(&self) -> AdjacencyBuilder {
        let mut builder = AdjacencyBuilder::new()
            .with_min_sources(self.min_sources)
            .with_drop(self.drop.iter().cloned())
            .with_filtered_table(true)
            .with_summaries(self.summaries);
        if let Some(m) = self.max_sources {
            builder = builder.with_max_sources(m);
        }
        if let Some(k) = self.max_interactions {
            builder = builder.with_max_interactions(k);
        }
        builder
    }

    fn engine(&self) -> CorrespondenceAnalysis {
        CorrespondenceAnalysis::new()
            .with_dimensions(self.dimensions)
            .with_svd(self.svd)
    }
}

#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Target scores on the first dimension, in matrix row order.
    pub targets: ScoreTable,
    /// Source scores aggregated from `targets`, highest first.
    pub sources: ScoreTable,
    /// Target scores for every requested dimension (index 0 equals `targets`).
    pub target_dimensions: Vec<ScoreTable>,
    pub target_summary: Option<Vec<(String, TargetSummary)>>,
    pub source_summary: Option<Vec<(String, SourceSummary)>>,
}

pub fn run_full_pipeline(records: &[Interaction], params: &PipelineParams) -> Result<PipelineOutput> {
    params.validate()?;
    if params.weighted {
        require_weights(records)?;
    }
    info!(
        "Running full pipeline over {} records (weighted={}, dimensions={})",
        records.len(),
        params.weighted,
        params.dimensions
    );

    let adjacency = params.builder().build(records)?;
    let target_dimensions = params.engine().row_scores(&adjacency.matrix)?;
    let targets = target_dimensions[0].clone();

    let filtered = adjacency.filtered.as_deref().unwrap_or_default();
    let sources = aggregate_source_scores(filtered, &targets, params.weighted);
    debug!(
        "Pipeline produced {} target scores and {} source scores",
        targets.len(),
        sources.len()
    );

    Ok(PipelineOutput {
        targets,
        sources,
        target_dimensions,
        target_summary: adjacency.target_summary,
        source_summary: adjacency.source_summary,
    })
}

/// Row and column scores of an already-built matrix, both by correspondence
/// analysis (first dimension). Both tables keep matrix order.
pub fn run_simplified(
    adjacency: &AdjacencyMatrix,
    svd: SvdMethod,
) -> Result<(ScoreTable, ScoreTable)> {
    let engine = CorrespondenceAnalysis::new().with_svd(svd);
    info!(
        "Scoring {} targets and {} sources from the adjacency matrix",
        adjacency.targets.len(),
        adjacency.sources.len()
    );
    let targets = engine.row_scores(adjacency)?.remove(0);
    let sources = engine.column_scores(adjacency)?.remove(0);
    Ok((targets, sources))
}
