use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::MergeError;
use crate::models::{Cell, Dataset};

/// One input of the join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// How to pick the value of a column present on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Take this side's value, falling back to the other side when missing
    Prefer(Side),
    /// Take this side's value only
    Only(Side),
}

/// Per-column collision resolutions plus an optional default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionPolicy {
    per_column: Vec<(String, Resolution)>,
    default: Option<Resolution>,
}

impl CollisionPolicy {
    /// Every collision must be listed explicitly
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn with_default(resolution: Resolution) -> Self {
        Self {
            per_column: Vec::new(),
            default: Some(resolution),
        }
    }

    pub fn resolve(mut self, column: &str, resolution: Resolution) -> Self {
        self.per_column.retain(|(c, _)| c != column);
        self.per_column.push((column.to_string(), resolution));
        self
    }

    pub fn resolution_for(&self, column: &str) -> Option<Resolution> {
        self.per_column
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, r)| *r)
            .or(self.default)
    }
}

/// Keyed view of one input: first row per key, in input order
struct KeyedRows<'a> {
    order: Vec<String>,
    rows: HashMap<String, &'a [Cell]>,
}

fn index_rows<'a>(dataset: &'a Dataset, key_idx: usize, side: Side) -> KeyedRows<'a> {
    let mut order = Vec::new();
    let mut rows = HashMap::new();
    let mut skipped = 0usize;
    let mut duplicates = 0usize;

    for row in dataset.rows() {
        let Some(key) = row[key_idx].as_text() else {
            skipped += 1;
            continue;
        };
        if rows.contains_key(&key) {
            duplicates += 1;
            continue;
        }
        order.push(key.clone());
        rows.insert(key, row.as_slice());
    }

    if skipped > 0 {
        warn!("{:?} input: dropped {} rows without a key", side, skipped);
    }
    if duplicates > 0 {
        warn!("{:?} input: ignored {} rows with a repeated key", side, duplicates);
    }
    KeyedRows { order, rows }
}

fn pick(resolution: Resolution, left: Option<&Cell>, right: Option<&Cell>) -> Cell {
    let present = |c: Option<&Cell>| c.filter(|c| !c.is_missing()).cloned();
    let picked = match resolution {
        Resolution::Only(Side::Left) => present(left),
        Resolution::Only(Side::Right) => present(right),
        Resolution::Prefer(Side::Left) => present(left).or_else(|| present(right)),
        Resolution::Prefer(Side::Right) => present(right).or_else(|| present(left)),
    };
    picked.unwrap_or(Cell::Missing)
}

/// Where a merged column takes its values from
enum ColumnSource {
    Left(usize),
    Right(usize),
    Both(usize, usize, Resolution),
}

/// Full outer join of two datasets on `key`
///
/// Every key of either input appears exactly once. Row order is the left
/// input's order followed by right-only keys. Columns are the key, the left
/// columns, then right columns the left lacks; shared columns are resolved
/// through `policy`.
pub fn outer_join(
    left: &Dataset,
    right: &Dataset,
    key: &str,
    policy: &CollisionPolicy,
) -> Result<Dataset, MergeError> {
    let (Some(lkey), Some(rkey)) = (left.column_index(key), right.column_index(key)) else {
        return Err(MergeError::MissingKey {
            key: key.to_string(),
            left: left.columns().to_vec(),
            right: right.columns().to_vec(),
        });
    };

    let mut columns = vec![key.to_string()];
    let mut sources = Vec::new();

    for (li, name) in left.columns().iter().enumerate() {
        if li == lkey {
            continue;
        }
        match right.column_index(name) {
            Some(ri) => {
                let resolution = policy
                    .resolution_for(name)
                    .ok_or_else(|| MergeError::UnresolvedCollision(name.clone()))?;
                debug!("Column '{}' on both sides, resolved as {:?}", name, resolution);
                sources.push(ColumnSource::Both(li, ri, resolution));
            }
            None => sources.push(ColumnSource::Left(li)),
        }
        columns.push(name.clone());
    }
    for (ri, name) in right.columns().iter().enumerate() {
        if ri != rkey && !left.has_column(name) {
            sources.push(ColumnSource::Right(ri));
            columns.push(name.clone());
        }
    }

    let lrows = index_rows(left, lkey, Side::Left);
    let rrows = index_rows(right, rkey, Side::Right);

    let keys = lrows
        .order
        .iter()
        .chain(rrows.order.iter().filter(|k| !lrows.rows.contains_key(*k)));

    let mut rows = Vec::new();
    for k in keys {
        let l = lrows.rows.get(k).copied();
        let r = rrows.rows.get(k).copied();

        let key_cell = l
            .map(|row| row[lkey].clone())
            .or_else(|| r.map(|row| row[rkey].clone()))
            .unwrap_or(Cell::Missing);

        let mut row = Vec::with_capacity(columns.len());
        row.push(key_cell);
        for source in &sources {
            let cell = match source {
                ColumnSource::Left(i) => l.map(|row| row[*i].clone()).unwrap_or(Cell::Missing),
                ColumnSource::Right(i) => r.map(|row| row[*i].clone()).unwrap_or(Cell::Missing),
                ColumnSource::Both(li, ri, res) => {
                    pick(*res, l.map(|row| &row[*li]), r.map(|row| &row[*ri]))
                }
            };
            row.push(cell);
        }
        rows.push(row);
    }

    debug!(
        "Outer join: {} left keys, {} right keys -> {} rows",
        lrows.order.len(),
        rrows.order.len(),
        rows.len()
    );
    Ok(Dataset::new(columns, rows))
}

/// Replace every missing cell with the placeholder text
pub fn fill_missing(dataset: &Dataset, placeholder: &str) -> Dataset {
    let mut out = dataset.clone();
    for row in out.rows_mut().iter_mut() {
        for cell in row.iter_mut().filter(|c| c.is_missing()) {
            *cell = Cell::Text(placeholder.to_string());
        }
    }
    out
}
