use tracing::{error, info};

use crate::error::MergeError;
use crate::filters::{ColumnVisibility, FilterSet, FilterSettings};
use crate::models::{Config, Dataset, Notice, PLACEHOLDER};
use crate::pipeline::{build_table, PipelineOptions, PipelineOutput};
use crate::sources::{read_sources, DatasetSource};

/// Result of fetching both sources and building the table
#[derive(Debug)]
pub struct LoadOutcome {
    pub notices: Vec<Notice>,
    pub result: Result<PipelineOutput, MergeError>,
}

pub fn filter_settings(config: &Config) -> FilterSettings {
    FilterSettings {
        categorical_threshold: config.categorical_threshold,
        placeholder: PLACEHOLDER.to_string(),
        exempt: Vec::new(),
    }
}

/// Fetch both sources and run the merge pipeline
///
/// Fetch failures become notices with empty datasets; a missing join key is
/// returned as the fatal `MergeError`.
pub async fn load_table<S>(source: &S, config: &Config) -> LoadOutcome
where
    S: DatasetSource + ?Sized + Sync,
{
    let (technical, fundamentals) = read_sources(source, &config.technical, &config.fundamentals).await;

    let mut notices = technical.notices;
    notices.extend(fundamentals.notices);

    let options = PipelineOptions::from_config(config);
    let result = build_table(&technical.dataset, &fundamentals.dataset, &options);
    if let Err(e) = &result {
        error!("Pipeline aborted: {}", e);
    }

    LoadOutcome { notices, result }
}

/// Interactive state: the loaded table plus the user's selections
///
/// Views are recomputed from (table, selections) on every call.
#[derive(Debug, Clone)]
pub struct Session {
    table: Dataset,
    filters: FilterSet,
    visibility: ColumnVisibility,
    settings: FilterSettings,
}

impl Session {
    pub fn new(table: Dataset, settings: FilterSettings) -> Self {
        let filters = FilterSet::derive(&table, &settings);
        let visibility = ColumnVisibility::all(table.columns());
        Self {
            table,
            filters,
            visibility,
            settings,
        }
    }

    /// Swap in a freshly loaded table, keeping selections that still apply
    pub fn replace_table(&mut self, table: Dataset) {
        let filters = FilterSet::derive(&table, &self.settings).rebase(&self.filters);
        let visibility = ColumnVisibility::all(table.columns()).rebase(&self.visibility);
        info!("Session reloaded with {} rows", table.row_count());
        self.table = table;
        self.filters = filters;
        self.visibility = visibility;
    }

    pub fn table(&self) -> &Dataset {
        &self.table
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    pub fn visibility(&self) -> &ColumnVisibility {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut ColumnVisibility {
        &mut self.visibility
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Rows passing the filters, all columns
    pub fn filtered(&self) -> Dataset {
        self.filters.apply(&self.table)
    }

    /// Rows passing the filters, visible columns only
    pub fn view(&self) -> Dataset {
        self.filtered().select(&self.visibility.visible_columns())
    }
}
