use tracing::info;

use crate::error::MergeError;
use crate::models::{Config, Dataset, KEY_COLUMN, PERIOD_COLUMN, PLACEHOLDER};

pub mod merge;
pub mod normalize;
pub mod project;

pub use merge::{fill_missing, outer_join, CollisionPolicy, Resolution, Side};
pub use normalize::normalize_columns;
pub use project::project;

/// Everything the merge-and-project stages need
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub key: String,
    pub placeholder: String,
    pub policy: CollisionPolicy,
    pub target_columns: Vec<String>,
}

impl PipelineOptions {
    /// Technical sheet on the left, fundamentals on the right; the
    /// fundamentals sheet owns `Period`
    pub fn from_config(config: &Config) -> Self {
        Self {
            key: KEY_COLUMN.to_string(),
            placeholder: PLACEHOLDER.to_string(),
            policy: CollisionPolicy::with_default(Resolution::Prefer(Side::Left))
                .resolve(PERIOD_COLUMN, Resolution::Only(Side::Right)),
            target_columns: config.target_columns.clone(),
        }
    }
}

/// Merged, filled and projected table
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub table: Dataset,
    pub absent_targets: Vec<String>,
}

/// Normalize both inputs, outer-join them, fill gaps, and project
pub fn build_table(
    left: &Dataset,
    right: &Dataset,
    options: &PipelineOptions,
) -> Result<PipelineOutput, MergeError> {
    let left = normalize_columns(left);
    let right = normalize_columns(right);

    let merged = outer_join(&left, &right, &options.key, &options.policy)?;
    let filled = fill_missing(&merged, &options.placeholder);
    let (table, absent_targets) = project(&filled, &options.target_columns);

    info!(
        "Built table: {} rows, {} of {} target columns",
        table.row_count(),
        table.columns().len(),
        options.target_columns.len()
    );
    Ok(PipelineOutput {
        table,
        absent_targets,
    })
}
