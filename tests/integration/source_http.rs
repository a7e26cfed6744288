//! Source reads against a local HTTP server

use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{csv_bytes, xlsx_bytes};
use crate::common::logging::{init_test_logging, log_test_step};
use crate::common::test_data::{dataset, fundamentals_sheet, keys, technical_sheet};
use hisse_dashboard::models::{Config, NoticeLevel, SheetFormat, SourceSpec, WorksheetSelector};
use hisse_dashboard::session::load_table;
use hisse_dashboard::sources::{read_source, SheetsClient};

fn csv_spec(name: &str, server: &MockServer, file: &str) -> SourceSpec {
    SourceSpec {
        format: SheetFormat::Csv,
        worksheet: WorksheetSelector::Default,
        ..SourceSpec::new(name, &format!("{}/{}", server.uri(), file))
    }
}

async fn serve(server: &MockServer, at: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_csv_source_is_read() {
    init_test_logging();
    log_test_step("Reading a CSV source over HTTP");

    let server = MockServer::start().await;
    serve(&server, "/technical.csv", csv_bytes(&technical_sheet())).await;

    let client = SheetsClient::new(&Config::default()).unwrap();
    let read = read_source(&client, &csv_spec("technical", &server, "technical.csv")).await;

    assert!(read.notices.is_empty());
    assert_eq!(read.dataset, technical_sheet());
}

#[tokio::test]
async fn test_xlsx_source_reads_last_worksheet() {
    let server = MockServer::start().await;
    let old = dataset(&["Hisse Adı", "Period"], &[&["THYAO", "2023/12"]]);
    let body = xlsx_bytes(&[("2023", &old), ("2024", &fundamentals_sheet())]);
    serve(&server, "/fundamentals.xlsx", body).await;

    let client = SheetsClient::new(&Config::default()).unwrap();
    let spec = SourceSpec::new("fundamentals", &format!("{}/fundamentals.xlsx", server.uri()));
    assert_eq!(spec.worksheet, WorksheetSelector::Last);

    let read = read_source(&client, &spec).await;
    assert!(read.notices.is_empty());
    assert_eq!(read.dataset.columns(), fundamentals_sheet().columns());
    assert_eq!(read.dataset, fundamentals_sheet());

    let by_title = SourceSpec {
        worksheet: WorksheetSelector::Title("2023".into()),
        ..spec
    };
    let read = read_source(&client, &by_title).await;
    assert_eq!(keys(&read.dataset), vec!["THYAO"]);
}

#[tokio::test]
async fn test_failed_fetch_yields_empty_dataset_and_notice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = SheetsClient::new(&Config::default()).unwrap();
    let read = read_source(&client, &csv_spec("technical", &server, "missing.csv")).await;

    assert!(read.dataset.is_empty());
    assert_eq!(read.notices.len(), 1);
    assert_eq!(read.notices[0].level, NoticeLevel::Error);
    assert!(read.notices[0].message.contains("404"));
}

#[tokio::test]
async fn test_allow_list_warns_about_missing_columns() {
    let server = MockServer::start().await;
    serve(&server, "/technical.csv", csv_bytes(&technical_sheet())).await;

    let client = SheetsClient::new(&Config::default()).unwrap();
    let spec = SourceSpec {
        allow_list: Some(vec!["Ticker".into(), "Geçen Gün".into(), "AVWAP +4σ".into()]),
        ..csv_spec("technical", &server, "technical.csv")
    };
    let read = read_source(&client, &spec).await;

    assert_eq!(read.dataset.columns(), &["Ticker".to_string(), "Geçen Gün".into()]);
    assert_eq!(read.notices.len(), 1);
    assert_eq!(read.notices[0].level, NoticeLevel::Warning);
    assert!(read.notices[0].message.contains("AVWAP +4σ"));
}

#[tokio::test]
async fn test_access_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private.csv"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(csv_bytes(&technical_sheet())))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        access_token: Some("s3cret".into()),
        ..Config::default()
    };
    let client = SheetsClient::new(&config).unwrap();
    let read = read_source(&client, &csv_spec("technical", &server, "private.csv")).await;
    assert!(read.notices.is_empty());
}

#[tokio::test]
async fn test_load_table_over_http() {
    init_test_logging();
    log_test_step("Loading and merging both sheets over HTTP");

    let server = MockServer::start().await;
    serve(&server, "/technical.csv", csv_bytes(&technical_sheet())).await;
    serve(&server, "/fundamentals.xlsx", xlsx_bytes(&[("Sheet1", &fundamentals_sheet())])).await;

    let config = Config {
        technical: csv_spec("technical", &server, "technical.csv"),
        fundamentals: SourceSpec::new("fundamentals", &format!("{}/fundamentals.xlsx", server.uri())),
        ..Config::default()
    };
    let client = SheetsClient::new(&config).unwrap();
    let outcome = load_table(&client, &config).await;

    assert!(outcome.notices.is_empty());
    let output = outcome.result.unwrap();
    assert_eq!(keys(&output.table), vec!["ASELS", "KCHOL", "PGSUS", "THYAO"]);
}
