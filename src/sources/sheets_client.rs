use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{decode::decode, DatasetSource};
use crate::error::SourceError;
use crate::models::{Config, Dataset, SheetFormat, SourceSpec, WorksheetSelector};

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// HTTP client for spreadsheet downloads
pub struct SheetsClient {
    client: Client,
    access_token: Option<String>,
}

impl SheetsClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("hisse-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            access_token: config.access_token.clone(),
        })
    }

    /// GET a URL and return the body, failing on non-success statuses
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let http_err = |source| SourceError::Http {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}", url, status);
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_err)?;
        debug!("GET {} -> {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DatasetSource for SheetsClient {
    async fn fetch(&self, spec: &SourceSpec) -> Result<Dataset, SourceError> {
        let url = export_url(&spec.location, spec.format, &spec.worksheet);
        info!("Fetching {} source from {}", spec.name, url);
        let bytes = self.fetch_bytes(&url).await?;
        decode(&bytes, spec.format, &spec.worksheet)
    }
}

/// Google Sheets spreadsheet id and optional worksheet gid of a location
fn sheet_coordinates(location: &str) -> Option<(String, Option<String>)> {
    let location = location.trim();

    if !location.contains('/') && !location.contains(':') && !location.is_empty() {
        return Some((location.to_string(), None));
    }

    let url = Url::parse(location).ok()?;
    if url.host_str() != Some("docs.google.com") {
        return None;
    }

    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "d")?;
    let id = segments.next().filter(|s| !s.is_empty())?.to_string();

    let gid = url
        .query_pairs()
        .find(|(k, _)| k == "gid")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            url.fragment()
                .and_then(|f| f.strip_prefix("gid="))
                .map(str::to_string)
        });

    Some((id, gid))
}

/// Build the download URL for a source location
///
/// Sheets edit links and bare ids become export links; any other URL is
/// returned unchanged. CSV exports can only address a worksheet by title
/// (through the gviz endpoint) or by the gid in the link; XLSX exports carry
/// the whole workbook and the worksheet is picked while decoding.
pub fn export_url(location: &str, format: SheetFormat, worksheet: &WorksheetSelector) -> String {
    let Some((id, gid)) = sheet_coordinates(location) else {
        return location.trim().to_string();
    };

    match (format, worksheet) {
        (SheetFormat::Xlsx, _) => format!("{}/{}/export?format=xlsx", SHEETS_BASE, id),
        (SheetFormat::Csv, WorksheetSelector::Title(title)) => {
            let encoded: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
            format!("{}/{}/gviz/tq?tqx=out:csv&sheet={}", SHEETS_BASE, id, encoded)
        }
        (SheetFormat::Csv, _) => match gid {
            Some(gid) => format!("{}/{}/export?format=csv&gid={}", SHEETS_BASE, id, gid),
            None => format!("{}/{}/export?format=csv", SHEETS_BASE, id),
        },
    }
}

/// True when the selector cannot be honoured for this source
pub fn selector_ignored(spec: &SourceSpec) -> bool {
    spec.format == SheetFormat::Csv
        && matches!(spec.worksheet, WorksheetSelector::Index(_) | WorksheetSelector::Last)
}
