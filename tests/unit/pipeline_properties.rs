//! Merge pipeline properties over realistic sheets

use pretty_assertions::assert_eq;
use test_log::test;

use crate::common::test_data::{dataset, fundamentals_sheet, keys, technical_sheet, text};
use hisse_dashboard::error::MergeError;
use hisse_dashboard::models::{Config, KEY_COLUMN, PLACEHOLDER};
use hisse_dashboard::pipeline::{
    build_table, normalize_columns, outer_join, project, CollisionPolicy, PipelineOptions,
};

fn options() -> PipelineOptions {
    PipelineOptions::from_config(&Config::default())
}

#[test]
fn test_merged_keys_are_union_of_sources() {
    let out = build_table(&technical_sheet(), &fundamentals_sheet(), &options()).unwrap();
    assert_eq!(keys(&out.table), vec!["ASELS", "KCHOL", "PGSUS", "THYAO"]);
    assert_eq!(out.table.row_count(), 4);
}

#[test]
fn test_one_sided_keys_get_placeholder() {
    let out = build_table(&technical_sheet(), &fundamentals_sheet(), &options()).unwrap();
    let kchol = out
        .table
        .rows()
        .iter()
        .position(|r| r[0] == text("KCHOL"))
        .unwrap();
    assert_eq!(out.table.cell(kchol, "Geçen Gün"), Some(&text(PLACEHOLDER)));
    assert_eq!(out.table.cell(kchol, "% Fark VWAP"), Some(&text(PLACEHOLDER)));

    let pgsus = out
        .table
        .rows()
        .iter()
        .position(|r| r[0] == text("PGSUS"))
        .unwrap();
    assert_eq!(out.table.cell(pgsus, "Period"), Some(&text(PLACEHOLDER)));
    assert_eq!(out.table.cell(pgsus, "Cari Oran"), Some(&text(PLACEHOLDER)));
    // blank in the source is filled too
    assert_eq!(out.table.cell(pgsus, "Geçen Gün"), Some(&text(PLACEHOLDER)));
}

#[test]
fn test_period_comes_from_fundamentals() {
    let out = build_table(&technical_sheet(), &fundamentals_sheet(), &options()).unwrap();
    let periods: Vec<String> = out
        .table
        .column_cells("Period")
        .unwrap()
        .filter_map(|c| c.as_text())
        .collect();
    assert!(!periods.iter().any(|p| p == "stale"));
    assert_eq!(out.table.cell(0, "Period"), Some(&text("2024/12")));
}

#[test]
fn test_projection_follows_target_order() {
    let out = build_table(&technical_sheet(), &fundamentals_sheet(), &options()).unwrap();
    assert_eq!(
        out.table.columns(),
        &[
            KEY_COLUMN.to_string(),
            "Geçen Gün".into(),
            "% Fark VWAP".into(),
            "Period".into(),
            "Cari Oran".into(),
        ]
    );
    assert!(!out.table.has_column("Sektör"));
    assert!(out.absent_targets.contains(&"AVWAP +4σ".to_string()));
}

#[test]
fn test_projector_skips_absent_targets() {
    let table = dataset(&["b", "a"], &[&["1", "2"]]);
    let (projected, absent) = project(&table, &["a".into(), "zz".into(), "b".into()]);
    assert_eq!(projected.columns(), &["a".to_string(), "b".into()]);
    assert_eq!(absent, vec!["zz".to_string()]);
}

#[test]
fn test_normalizer_is_idempotent() {
    for sheet in [technical_sheet(), fundamentals_sheet()] {
        let once = normalize_columns(&sheet);
        assert_eq!(normalize_columns(&once), once);
        assert!(once.has_column(KEY_COLUMN));
    }
}

#[test]
fn test_period_scenario() {
    let a = dataset(&[KEY_COLUMN, "Period"], &[&["X", "1"]]);
    let b = dataset(&[KEY_COLUMN, "val"], &[&["X", "10"], &["Y", "20"]]);
    let mut options = options();
    options.target_columns = vec![KEY_COLUMN.into(), "Period".into(), "val".into()];

    let out = build_table(&b, &a, &options).unwrap();
    assert_eq!(out.table.rows()[0], vec![text("X"), text("1"), text("10")]);
    assert_eq!(out.table.rows()[1], vec![text("Y"), text(PLACEHOLDER), text("20")]);
}

#[test]
fn test_missing_key_lists_both_column_sets() {
    let a = dataset(&["Symbol", "x"], &[&["X", "1"]]);
    let err = build_table(&a, &fundamentals_sheet(), &options()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Hisse Adı"));
    assert!(message.contains("Symbol"));
    assert!(message.contains("Cari Oran"));
}

#[test]
fn test_strict_policy_rejects_shared_columns() {
    let left = normalize_columns(&technical_sheet());
    let right = normalize_columns(&fundamentals_sheet());
    let err = outer_join(&left, &right, KEY_COLUMN, &CollisionPolicy::strict()).unwrap_err();
    assert_eq!(err, MergeError::UnresolvedCollision("Period".into()));
}
