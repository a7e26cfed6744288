use tracing::warn;

use crate::models::{Cell, Dataset, KEY_ALIAS, KEY_COLUMN};

/// Trim column labels and rename the key alias to the canonical key
///
/// When a dataset already carries the canonical key, an alias column is left
/// as it is so that labels stay unique. Key cells are trimmed as well.
pub fn normalize_columns(dataset: &Dataset) -> Dataset {
    let mut out = dataset.clone();

    for label in out.columns_mut().iter_mut() {
        let trimmed = label.trim();
        if trimmed.len() != label.len() {
            *label = trimmed.to_string();
        }
    }

    let has_key = out.has_column(KEY_COLUMN);
    if let Some(idx) = out.column_index(KEY_ALIAS) {
        if has_key {
            warn!("Both '{}' and '{}' present; keeping '{}' as-is", KEY_COLUMN, KEY_ALIAS, KEY_ALIAS);
        } else {
            out.columns_mut()[idx] = KEY_COLUMN.to_string();
        }
    }

    if let Some(key_idx) = out.column_index(KEY_COLUMN) {
        for row in out.rows_mut().iter_mut() {
            let cleaned = match &row[key_idx] {
                Cell::Text(s) => Cell::from_text(s),
                _ => continue,
            };
            row[key_idx] = cleaned;
        }
    }

    out
}
