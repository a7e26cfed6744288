use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ExportError;
use crate::filters::{classify_column, parse_numeric, ColumnKind, FilterSettings, Numeric};
use crate::links::chart_url;
use crate::models::{Cell, Dataset, PLACEHOLDER};

pub const DEFAULT_EXPORT_FILENAME: &str = "hisse_analizi_filtered.xlsx";
const NUMBER_FORMAT: &str = "0.00";

/// Key column cells rendered as links to a chart page
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLinks {
    pub key_column: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub placeholder: String,
    pub chart_links: Option<ChartLinks>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            placeholder: PLACEHOLDER.to_string(),
            chart_links: None,
        }
    }
}

/// Serialize exactly the given rows and columns to an xlsx workbook
///
/// Columns classified numeric are written as numbers with two decimals, their
/// stray non-numeric cells as text; everything else is written as text. An empty table yields
/// a header-only workbook.
pub fn to_xlsx(dataset: &Dataset, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(NUMBER_FORMAT);

    let settings = FilterSettings {
        placeholder: options.placeholder.clone(),
        categorical_threshold: usize::MAX,
        exempt: Vec::new(),
    };
    let numeric_columns: Vec<bool> = dataset
        .columns()
        .iter()
        .map(|c| classify_column(dataset, c, &settings) == ColumnKind::Numeric)
        .collect();
    let link_column = options
        .chart_links
        .as_ref()
        .and_then(|links| dataset.column_index(&links.key_column).map(|i| (i, links)));

    let worksheet = workbook.add_worksheet();

    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (r, row) in dataset.rows().iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let col_num = c as u16;

            if let Some((link_idx, links)) = link_column {
                if link_idx == c {
                    if let Some(symbol) = cell.as_text() {
                        let url = chart_url(&links.template, &symbol);
                        worksheet.write_url_with_text(row_num, col_num, url.as_str(), symbol.as_str())?;
                        continue;
                    }
                }
            }

            match cell {
                Cell::Missing => {}
                _ if numeric_columns[c] => match parse_numeric(cell, &options.placeholder) {
                    Numeric::Value(v) => {
                        worksheet.write_number_with_format(row_num, col_num, v, &number_format)?;
                    }
                    Numeric::Missing => {
                        worksheet.write_string(row_num, col_num, cell.to_string())?;
                    }
                },
                Cell::Number(v) => {
                    worksheet.write_number(row_num, col_num, *v)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(workbook.save_to_buffer()?)
}

/// Write the workbook to `dir/DEFAULT_EXPORT_FILENAME` and return the path
pub fn write_xlsx(dataset: &Dataset, options: &ExportOptions, dir: &Path) -> Result<PathBuf, ExportError> {
    write_xlsx_to(dataset, options, &dir.join(DEFAULT_EXPORT_FILENAME))
}

pub fn write_xlsx_to(dataset: &Dataset, options: &ExportOptions, path: &Path) -> Result<PathBuf, ExportError> {
    let bytes = to_xlsx(dataset, options)?;
    std::fs::write(path, bytes)?;
    info!(
        "Exported {} rows x {} columns to {}",
        dataset.row_count(),
        dataset.columns().len(),
        path.display()
    );
    Ok(path.to_path_buf())
}
