//! End-to-end: load, filter, present, and export

use crossterm::event::KeyCode;
use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::fixtures::StubSource;
use crate::common::logging::{init_test_logging, log_test_data, log_test_step};
use crate::common::test_data::{fundamentals_sheet, keys, technical_sheet};
use hisse_dashboard::cli::{inspect, parse_range, parse_select, render_report, run_export, ExportArgs};
use hisse_dashboard::export::DEFAULT_EXPORT_FILENAME;
use hisse_dashboard::models::{Cell, Config, WorksheetSelector, KEY_COLUMN};
use hisse_dashboard::sources::decode::decode_xlsx;
use hisse_dashboard::ui::{Action, DashboardApp};

fn stub() -> StubSource {
    StubSource::default()
        .with("technical", technical_sheet())
        .with("fundamentals", fundamentals_sheet())
}

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        export_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

#[test(tokio::test)]
async fn test_headless_export_applies_filters_and_columns() {
    init_test_logging();
    log_test_step("Exporting a filtered view headlessly");

    let dir = tempfile::tempdir().unwrap();
    let args = ExportArgs {
        columns: vec![KEY_COLUMN.into(), "Cari Oran".into()],
        ranges: vec![parse_range("Cari Oran=1..").unwrap()],
        selections: vec![parse_select("Period=2024/12").unwrap()],
        links: true,
        ..ExportArgs::default()
    };

    let path = run_export(&stub(), &config_in(dir.path()), &args).await.unwrap();
    assert_eq!(path, dir.path().join(DEFAULT_EXPORT_FILENAME));

    let back = decode_xlsx(&std::fs::read(&path).unwrap(), &WorksheetSelector::Default).unwrap();
    log_test_data("exported", &back);
    assert_eq!(back.columns(), &[KEY_COLUMN.to_string(), "Cari Oran".into()]);
    // THYAO passes both; PGSUS has neither value; ASELS and KCHOL are filtered out
    assert_eq!(keys(&back), vec!["PGSUS", "THYAO"]);
    assert_eq!(back.cell(0, "Cari Oran"), Some(&Cell::Number(1.4)));
}

#[test(tokio::test)]
async fn test_export_to_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("screen.xlsx");
    let args = ExportArgs {
        output: Some(target.clone()),
        ..ExportArgs::default()
    };
    let path = run_export(&stub(), &Config::default(), &args).await.unwrap();
    assert_eq!(path, target);

    let back = decode_xlsx(&std::fs::read(&path).unwrap(), &WorksheetSelector::Default).unwrap();
    assert_eq!(back.row_count(), 4);
}

#[test(tokio::test)]
async fn test_range_on_text_column_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let args = ExportArgs {
        ranges: vec![parse_range("Period=1..2").unwrap()],
        ..ExportArgs::default()
    };
    let err = run_export(&stub(), &config_in(dir.path()), &args).await.unwrap_err();
    assert!(err.to_string().contains("--select"));
    assert!(!dir.path().join(DEFAULT_EXPORT_FILENAME).exists());
}

#[test(tokio::test)]
async fn test_unreachable_source_is_fatal_for_export() {
    let source = StubSource::default().with("fundamentals", fundamentals_sheet());
    let dir = tempfile::tempdir().unwrap();
    let err = run_export(&source, &config_in(dir.path()), &ExportArgs::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("must exist in both tables"));
}

#[test(tokio::test)]
async fn test_inspect_reports_filters() {
    let report = inspect(&stub(), &Config::default()).await.unwrap();
    assert_eq!(report.rows, 4);

    let text = render_report(&report, false).unwrap();
    assert!(text.contains("4 rows x 5 columns"));
    assert!(text.contains("Cari Oran"));

    let json: serde_json::Value = serde_json::from_str(&render_report(&report, true).unwrap()).unwrap();
    let kinds: Vec<&str> = json["filters"]["filters"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"numeric"));
    assert!(kinds.contains(&"categorical"));
}

#[test(tokio::test)]
async fn test_dashboard_session_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = DashboardApp::new(stub(), config_in(dir.path()));
    app.reload().await;
    assert_eq!(app.state.view().row_count(), 4);

    // untick the first option of the first filter (the stock-name multiselect)
    app.state.handle_key(KeyCode::Down);
    app.state.handle_key(KeyCode::Char(' '));
    assert_eq!(app.state.view().row_count(), 3);

    // selections survive a reload
    assert_eq!(app.state.handle_key(KeyCode::Char('r')), Action::Reload);
    app.reload().await;
    assert_eq!(app.state.view().row_count(), 3);

    assert_eq!(app.state.handle_key(KeyCode::Char('e')), Action::Export);
    app.export();
    let back = decode_xlsx(
        &std::fs::read(dir.path().join(DEFAULT_EXPORT_FILENAME)).unwrap(),
        &WorksheetSelector::Default,
    )
    .unwrap();
    assert_eq!(back.row_count(), 3);
}
