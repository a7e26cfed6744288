use tracing::debug;

use crate::models::Dataset;

/// Restrict a table to the target columns it has, in target order
///
/// Returns the projected table and the targets that were absent.
pub fn project(dataset: &Dataset, targets: &[String]) -> (Dataset, Vec<String>) {
    let absent: Vec<String> = targets
        .iter()
        .filter(|t| !dataset.has_column(t))
        .cloned()
        .collect();
    if !absent.is_empty() {
        debug!("Projection skipped absent columns {:?}", absent);
    }
    (dataset.select(targets), absent)
}
