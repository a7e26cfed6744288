use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::SourceError;
use crate::models::{Dataset, Notice, SourceSpec};

pub mod decode;
pub mod sheets_client;
pub use sheets_client::{export_url, SheetsClient};

/// Anything that can produce a dataset for a source spec
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSource {
    async fn fetch(&self, spec: &SourceSpec) -> Result<Dataset, SourceError>;
}

/// Outcome of reading one source; failures are folded into notices
#[derive(Debug, Clone)]
pub struct SourceRead {
    pub dataset: Dataset,
    pub notices: Vec<Notice>,
}

/// Read one source, never propagating a failure
///
/// A failed fetch yields an empty dataset plus an error notice. Allow-listed
/// columns that the source lacks yield a warning notice.
pub async fn read_source<S>(source: &S, spec: &SourceSpec) -> SourceRead
where
    S: DatasetSource + ?Sized + Sync,
{
    let mut notices = Vec::new();

    if sheets_client::selector_ignored(spec) {
        warn!("{}: worksheet {:?} needs xlsx format", spec.name, spec.worksheet);
        notices.push(Notice::warning(format!(
            "{}: worksheet selection by position needs the xlsx format, reading the default worksheet",
            spec.name
        )));
    }

    let dataset = match source.fetch(spec).await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("Failed to read {} source: {}", spec.name, e);
            notices.push(Notice::error(format!("Could not load {} data: {}", spec.name, e)));
            return SourceRead {
                dataset: Dataset::empty(),
                notices,
            };
        }
    };

    let dataset = match &spec.allow_list {
        Some(allow) => {
            let (kept, missing) = apply_allow_list(&dataset, allow);
            if !missing.is_empty() {
                warn!("{} source lacks columns {:?}", spec.name, missing);
                notices.push(Notice::warning(format!(
                    "{}: columns not found and skipped: {}",
                    spec.name,
                    missing.join(", ")
                )));
            }
            kept
        }
        None => dataset,
    };

    info!(
        "Loaded {} source: {} rows x {} columns",
        spec.name,
        dataset.row_count(),
        dataset.columns().len()
    );
    SourceRead { dataset, notices }
}

/// Read both sources concurrently
pub async fn read_sources<S>(source: &S, left: &SourceSpec, right: &SourceSpec) -> (SourceRead, SourceRead)
where
    S: DatasetSource + ?Sized + Sync,
{
    futures::future::join(read_source(source, left), read_source(source, right)).await
}

/// Keep the allow-listed columns in allow-list order
///
/// Labels are compared after trimming. Returns the projected dataset and the
/// allow-listed names that were not found.
pub fn apply_allow_list(dataset: &Dataset, allow: &[String]) -> (Dataset, Vec<String>) {
    let mut present = Vec::new();
    let mut missing = Vec::new();

    for wanted in allow {
        match dataset.columns().iter().find(|c| c.trim() == wanted.trim()) {
            Some(actual) => present.push(actual.clone()),
            None => missing.push(wanted.clone()),
        }
    }

    (dataset.select(&present), missing)
}
