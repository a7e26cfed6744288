//! Common test utilities and helpers

pub mod fixtures;

/// Test data utilities
pub mod test_data {
    use hisse_dashboard::models::{Cell, Dataset};

    pub fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    /// Build a dataset from string cells; "" becomes a missing cell
    pub fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| Cell::from_text(v)).collect())
                .collect(),
        )
    }

    /// Technical indicator sheet as it arrives from the spreadsheet
    pub fn technical_sheet() -> Dataset {
        dataset(
            &["Ticker", "Geçen Gün", "% Fark VWAP", "Period"],
            &[
                &["THYAO", "4", "2,5", "stale"],
                &["ASELS", "12", "-1.25", "stale"],
                &["PGSUS", "", "7", "stale"],
            ],
        )
    }

    /// Fundamentals sheet with a trailing-space key header
    pub fn fundamentals_sheet() -> Dataset {
        dataset(
            &["Hisse Adı ", "Period", "Cari Oran", "Sektör"],
            &[
                &["THYAO", "2024/12", "1.4", "Ulaşım"],
                &["ASELS", "2024/09", "2.1", "Savunma"],
                &["KCHOL", "2024/12", "0.9", "Holding"],
            ],
        )
    }

    /// Sorted key column of a table
    pub fn keys(table: &Dataset) -> Vec<String> {
        let mut keys: Vec<String> = table
            .column_cells(hisse_dashboard::models::KEY_COLUMN)
            .into_iter()
            .flatten()
            .filter_map(Cell::as_text)
            .collect();
        keys.sort();
        keys
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test may already have installed a subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("hisse_dashboard=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("🧪 Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("📊 {}: {:?}", label, data);
    }
}
