//! Filter derivation and application on merged tables

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::test_data::{dataset, fundamentals_sheet, keys, technical_sheet};
use hisse_dashboard::export::{to_xlsx, ExportOptions};
use hisse_dashboard::filters::{apply_filters, ColumnFilter, FilterSet, FilterSettings};
use hisse_dashboard::models::{Config, WorksheetSelector, KEY_COLUMN};
use hisse_dashboard::pipeline::{build_table, PipelineOptions};
use hisse_dashboard::session::Session;
use hisse_dashboard::sources::decode::decode_xlsx;

fn merged_session() -> Session {
    let options = PipelineOptions::from_config(&Config::default());
    let out = build_table(&technical_sheet(), &fundamentals_sheet(), &options).unwrap();
    Session::new(out.table, FilterSettings::default())
}

#[test]
fn test_categorical_scenario() {
    let table = dataset(&["c"], &[&["A"], &["A"], &["B"]]);
    let set = FilterSet::derive(&table, &FilterSettings::default());
    let filter = assert_matches!(set.get("c"), Some(ColumnFilter::Categorical(f)) => f);
    assert_eq!(filter.options, vec!["A".to_string(), "B".to_string()]);
    assert!(filter.is_selected("A") && filter.is_selected("B"));
    assert_eq!(apply_filters(&table, &set).row_count(), 3);
}

#[test]
fn test_numeric_scenario() {
    let table = dataset(&["n"], &[&["5"], &["N/A"], &["15"]]);
    let mut set = FilterSet::derive(&table, &FilterSettings::default());
    let filter = assert_matches!(set.get_mut("n"), Some(ColumnFilter::Numeric(f)) => f);
    assert_eq!((filter.missing, filter.min, filter.max), (1, 5.0, 15.0));
    filter.set_range(5.0, 15.0);
    assert_eq!(apply_filters(&table, &set).row_count(), 3);
}

#[test]
fn test_merged_table_filter_kinds() {
    let session = merged_session();
    let filters = session.filters();

    let vwap = assert_matches!(filters.get("% Fark VWAP"), Some(ColumnFilter::Numeric(f)) => f);
    assert_eq!((vwap.min, vwap.max), (-1.25, 7.0));

    let period = assert_matches!(filters.get("Period"), Some(ColumnFilter::Categorical(f)) => f);
    assert_eq!(period.options, vec!["2024/12".to_string(), "2024/09".to_string()]);

    assert_eq!(filters.active_count(), 0);
    assert_eq!(session.filtered().row_count(), 4);
}

#[test]
fn test_range_keeps_rows_with_missing_values() {
    let mut session = merged_session();
    if let Some(ColumnFilter::Numeric(f)) = session.filters_mut().get_mut("Cari Oran") {
        f.set_range(1.0, 2.1);
    }
    // KCHOL (0.9) drops out; PGSUS has no fundamentals and stays
    assert_eq!(keys(&session.view()), vec!["ASELS", "PGSUS", "THYAO"]);
}

#[test]
fn test_combined_filters_intersect() {
    let mut session = merged_session();
    if let Some(ColumnFilter::Categorical(f)) = session.filters_mut().get_mut("Period") {
        f.select_only(&["2024/12"]);
    }
    if let Some(ColumnFilter::Numeric(f)) = session.filters_mut().get_mut("Geçen Gün") {
        f.set_range(10.0, 12.0);
    }
    // THYAO: 2024/12 but 4 days; KCHOL: 2024/12, days missing; PGSUS: both missing
    assert_eq!(keys(&session.view()), vec!["KCHOL", "PGSUS"]);
}

#[test]
fn test_zero_rows_export_header_only() {
    let mut session = merged_session();
    if let Some(ColumnFilter::Categorical(f)) = session.filters_mut().get_mut(KEY_COLUMN) {
        f.select_only::<&str>(&[]);
    }
    let view = session.view();
    assert_eq!(view.row_count(), 0);

    let bytes = to_xlsx(&view, &ExportOptions::default()).unwrap();
    let back = decode_xlsx(&bytes, &WorksheetSelector::Default).unwrap();
    assert_eq!(back.columns(), view.columns());
    assert_eq!(back.row_count(), 0);
}
