use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use crate::models::{Cell, Dataset, DEFAULT_CATEGORICAL_THRESHOLD, PLACEHOLDER};

pub mod numeric;
pub mod visibility;

pub use numeric::{parse_numeric, Numeric, NumericFilter};
pub use visibility::ColumnVisibility;

/// How a column is filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Unfiltered,
}

/// Knobs for deriving filters from a table
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSettings {
    /// Text columns with fewer distinct values than this get a multi-select
    pub categorical_threshold: usize,
    pub placeholder: String,
    /// Columns never offered a filter
    pub exempt: Vec<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            categorical_threshold: DEFAULT_CATEGORICAL_THRESHOLD,
            placeholder: PLACEHOLDER.to_string(),
            exempt: Vec::new(),
        }
    }
}

fn is_blank(cell: &Cell, placeholder: &str) -> bool {
    match cell {
        Cell::Missing => true,
        Cell::Text(s) => s == placeholder,
        Cell::Number(_) => false,
    }
}

/// Decide whether a column is numeric, categorical, or left unfiltered
///
/// Numeric: more present values parse than not; the stray ones are treated
/// as missing. Categorical: fewer distinct present values than the
/// threshold. The placeholder and missing cells are ignored by both tests.
pub fn classify_column(dataset: &Dataset, column: &str, settings: &FilterSettings) -> ColumnKind {
    if settings.exempt.iter().any(|c| c == column) {
        return ColumnKind::Unfiltered;
    }
    let Some(cells) = dataset.column_cells(column) else {
        return ColumnKind::Unfiltered;
    };

    let mut parsed = 0usize;
    let mut unparsed = 0usize;
    let mut distinct = HashSet::new();

    for cell in cells.filter(|c| !is_blank(c, &settings.placeholder)) {
        match parse_numeric(cell, &settings.placeholder) {
            Numeric::Value(_) => parsed += 1,
            Numeric::Missing => unparsed += 1,
        }
        if let Some(text) = cell.as_text() {
            distinct.insert(text);
        }
    }

    if parsed > unparsed {
        ColumnKind::Numeric
    } else if !distinct.is_empty() && distinct.len() < settings.categorical_threshold {
        ColumnKind::Categorical
    } else {
        ColumnKind::Unfiltered
    }
}

/// Multi-select over the distinct values of a text column
///
/// Placeholder and missing cells always pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalFilter {
    pub column: String,
    /// Distinct observed values in first-seen order
    pub options: Vec<String>,
    pub selected: BTreeSet<String>,
}

impl CategoricalFilter {
    pub fn from_cells<'a, I>(column: &str, cells: I, placeholder: &str) -> Self
    where
        I: IntoIterator<Item = &'a Cell>,
    {
        let mut options: Vec<String> = Vec::new();
        for cell in cells {
            if is_blank(cell, placeholder) {
                continue;
            }
            if let Some(text) = cell.as_text() {
                if !options.contains(&text) {
                    options.push(text);
                }
            }
        }
        let selected = options.iter().cloned().collect();
        Self {
            column: column.to_string(),
            options,
            selected,
        }
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }

    pub fn toggle(&mut self, value: &str) {
        if !self.selected.remove(value) && self.options.iter().any(|o| o == value) {
            self.selected.insert(value.to_string());
        }
    }

    /// Replace the selection; values that are not options are ignored
    pub fn select_only<S: AsRef<str>>(&mut self, values: &[S]) {
        self.selected = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| self.options.iter().any(|o| o == v))
            .map(str::to_string)
            .collect();
    }

    pub fn reset(&mut self) {
        self.selected = self.options.iter().cloned().collect();
    }

    pub fn is_active(&self) -> bool {
        self.selected.len() < self.options.len()
    }

    pub fn passes(&self, cell: &Cell, placeholder: &str) -> bool {
        if is_blank(cell, placeholder) {
            return true;
        }
        cell.as_text().map_or(true, |t| self.selected.contains(&t))
    }

    /// Keep prior choices; options new to this load start selected
    pub fn rebase(&mut self, previous: &CategoricalFilter) {
        self.selected = self
            .options
            .iter()
            .filter(|o| previous.is_selected(o) || !previous.options.contains(o))
            .cloned()
            .collect();
    }
}

/// Filter control for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnFilter {
    Categorical(CategoricalFilter),
    Numeric(NumericFilter),
}

impl ColumnFilter {
    pub fn column(&self) -> &str {
        match self {
            ColumnFilter::Categorical(f) => &f.column,
            ColumnFilter::Numeric(f) => &f.column,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            ColumnFilter::Categorical(f) => f.is_active(),
            ColumnFilter::Numeric(f) => f.is_active(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            ColumnFilter::Categorical(f) => f.reset(),
            ColumnFilter::Numeric(f) => f.reset(),
        }
    }

    pub fn passes(&self, cell: &Cell, placeholder: &str) -> bool {
        match self {
            ColumnFilter::Categorical(f) => f.passes(cell, placeholder),
            ColumnFilter::Numeric(f) => f.passes(parse_numeric(cell, placeholder)),
        }
    }
}

/// Filters for every filterable column of a table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSet {
    pub filters: Vec<ColumnFilter>,
    #[serde(skip)]
    pub placeholder: String,
}

impl FilterSet {
    /// Derive one filter per filterable column, spanning its full domain
    pub fn derive(dataset: &Dataset, settings: &FilterSettings) -> Self {
        let mut filters = Vec::new();

        for column in dataset.columns() {
            let Some(cells) = dataset.column_cells(column) else {
                continue;
            };
            match classify_column(dataset, column, settings) {
                ColumnKind::Categorical => filters.push(ColumnFilter::Categorical(
                    CategoricalFilter::from_cells(column, cells, &settings.placeholder),
                )),
                ColumnKind::Numeric => {
                    let values = cells.map(|c| parse_numeric(c, &settings.placeholder));
                    if let Some(f) = NumericFilter::from_values(column, values) {
                        filters.push(ColumnFilter::Numeric(f));
                    }
                }
                ColumnKind::Unfiltered => {}
            }
        }

        debug!("Derived {} filters over {} columns", filters.len(), dataset.columns().len());
        Self {
            filters,
            placeholder: settings.placeholder.clone(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.iter().find(|f| f.column() == column)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut ColumnFilter> {
        self.filters.iter_mut().find(|f| f.column() == column)
    }

    pub fn active_count(&self) -> usize {
        self.filters.iter().filter(|f| f.is_active()).count()
    }

    /// Re-apply a previous session's selections onto freshly derived filters
    pub fn rebase(mut self, previous: &FilterSet) -> Self {
        for filter in self.filters.iter_mut() {
            let Some(prev) = previous.get(filter.column()) else {
                continue;
            };
            match (filter, prev) {
                (ColumnFilter::Categorical(f), ColumnFilter::Categorical(p)) => f.rebase(p),
                (ColumnFilter::Numeric(f), ColumnFilter::Numeric(p)) => f.rebase(p),
                _ => {}
            }
        }
        self
    }

    /// Rows of `dataset` passing every filter
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        let bound: Vec<(usize, &ColumnFilter)> = self
            .filters
            .iter()
            .filter_map(|f| dataset.column_index(f.column()).map(|i| (i, f)))
            .collect();

        dataset.retain_rows(|row| {
            bound
                .iter()
                .all(|(i, f)| f.passes(&row[*i], &self.placeholder))
        })
    }
}

/// Filters spanning the full observed domain of every filterable column
pub fn derive_filters(dataset: &Dataset, settings: &FilterSettings) -> FilterSet {
    FilterSet::derive(dataset, settings)
}

/// Pure filter step: (table, selections) -> filtered table
pub fn apply_filters(dataset: &Dataset, filters: &FilterSet) -> Dataset {
    filters.apply(dataset)
}
