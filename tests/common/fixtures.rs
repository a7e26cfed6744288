//! Stub sources and serialized spreadsheet fixtures

use async_trait::async_trait;
use rust_xlsxwriter::Workbook;
use std::collections::HashMap;

use hisse_dashboard::error::SourceError;
use hisse_dashboard::models::{Dataset, SourceSpec};
use hisse_dashboard::sources::DatasetSource;

/// In-memory source keyed by spec name; unknown names answer 404
#[derive(Default)]
pub struct StubSource {
    datasets: HashMap<String, Dataset>,
}

impl StubSource {
    pub fn with(mut self, name: &str, dataset: Dataset) -> Self {
        self.datasets.insert(name.to_string(), dataset);
        self
    }
}

#[async_trait]
impl DatasetSource for StubSource {
    async fn fetch(&self, spec: &SourceSpec) -> Result<Dataset, SourceError> {
        self.datasets
            .get(&spec.name)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                url: spec.location.clone(),
                status: 404,
            })
    }
}

/// Serialize a dataset as CSV text
pub fn csv_bytes(dataset: &Dataset) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(dataset.columns()).unwrap();
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(|c| c.as_text().unwrap_or_default()))
            .unwrap();
    }
    writer.into_inner().unwrap()
}

/// Workbook with one worksheet per (title, dataset), in order
pub fn xlsx_bytes(sheets: &[(&str, &Dataset)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (title, dataset) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*title).unwrap();
        for (c, name) in dataset.columns().iter().enumerate() {
            worksheet.write_string(0, c as u16, name).unwrap();
        }
        for (r, row) in dataset.rows().iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if let Some(text) = cell.as_text() {
                    worksheet.write_string((r + 1) as u32, c as u16, text).unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}
