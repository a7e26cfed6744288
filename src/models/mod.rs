use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

pub mod table;
pub use table::{Cell, Dataset};

/// Canonical join key ("stock name")
pub const KEY_COLUMN: &str = "Hisse Adı";
/// Alias some sheets use for the key column
pub const KEY_ALIAS: &str = "Ticker";
/// Column both sheets carry; the fundamentals sheet is authoritative
pub const PERIOD_COLUMN: &str = "Period";
/// Text substituted for missing cells after the merge
pub const PLACEHOLDER: &str = "N/A";
pub const DEFAULT_CATEGORICAL_THRESHOLD: usize = 100;
pub const DEFAULT_CHART_URL_TEMPLATE: &str = "https://www.tradingview.com/chart/?symbol=BIST:{symbol}";

pub const DEFAULT_FUNDAMENTALS_SHEET: &str = "1u9WT-P9dEoXYuCOX1ojkFUySeJVmznc6dEFzhq0Ob8M";
pub const DEFAULT_TECHNICAL_SHEET: &str = "1MnhlPTx6aD5a4xuqsVLRw3ktLmf-NwSpXtw_IteXIFs";

/// Columns shown by the dashboard, in display order
pub const TARGET_COLUMNS: &[&str] = &[
    "Hisse Adı",
    "ATH Değişimi TL (%)",
    "Geçen Gün",
    "AVWAP +4σ",
    "% Fark VWAP",
    "% Fark POC",
    "% Fark VAL",
    "VAH / VAL Yüzdesi (%)",
    "VP Bant / ATH Aralığı (%)",
    "Period",
    "Ortalama Hedef Fiyat",
    "OHD - USD",
    "Hisse Potansiyeli (Yüzde)",
    "YDF Oranı",
    "Özkaynak Karlılığı",
    "Yıllık Net Kar",
    "Borç Özkaynak Oranı",
    "Ödenmiş Sermaye",
    "FD/FAVÖK",
    "ROIC Oranı",
    "Cari Oran",
    "Net Borç/Favök",
];

/// Download format of a spreadsheet source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl FromStr for SheetFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" => Ok(SheetFormat::Xlsx),
            other => Err(ConfigError::Invalid {
                name: "HISSE_SHEET_FORMAT",
                expected: "csv or xlsx",
                value: other.to_string(),
            }),
        }
    }
}

/// Which worksheet of a workbook to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WorksheetSelector {
    /// Whatever the location points at (first sheet, or the URL's gid)
    Default,
    Index(usize),
    Title(String),
    Last,
}

impl WorksheetSelector {
    /// "last", a zero-based index, or a worksheet title
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            WorksheetSelector::Default
        } else if raw.eq_ignore_ascii_case("last") {
            WorksheetSelector::Last
        } else if let Ok(idx) = raw.parse::<usize>() {
            WorksheetSelector::Index(idx)
        } else {
            WorksheetSelector::Title(raw.to_string())
        }
    }
}

/// Where and how to read one dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSpec {
    /// Human readable name used in notices
    pub name: String,
    /// Sheets URL, spreadsheet id, or direct file URL
    pub location: String,
    pub format: SheetFormat,
    pub worksheet: WorksheetSelector,
    pub allow_list: Option<Vec<String>>,
}

impl SourceSpec {
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            format: SheetFormat::Xlsx,
            worksheet: WorksheetSelector::Last,
            allow_list: None,
        }
    }
}

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Message surfaced to the user inline rather than through logs
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub timestamp: DateTime<Utc>,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub fundamentals: SourceSpec,
    pub technical: SourceSpec,
    pub access_token: Option<String>,
    pub http_timeout_secs: u64,
    pub categorical_threshold: usize,
    pub chart_url_template: String,
    pub export_dir: PathBuf,
    pub target_columns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fundamentals: SourceSpec::new("fundamentals", DEFAULT_FUNDAMENTALS_SHEET),
            technical: SourceSpec::new("technical", DEFAULT_TECHNICAL_SHEET),
            access_token: None,
            http_timeout_secs: 30,
            categorical_threshold: DEFAULT_CATEGORICAL_THRESHOLD,
            chart_url_template: DEFAULT_CHART_URL_TEMPLATE.to_string(),
            export_dir: PathBuf::from("."),
            target_columns: TARGET_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable lookup; unset values take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(loc) = lookup("HISSE_FUNDAMENTALS_SHEET") {
            config.fundamentals.location = loc;
        }
        if let Some(loc) = lookup("HISSE_TECHNICAL_SHEET") {
            config.technical.location = loc;
        }
        if let Some(fmt) = lookup("HISSE_SHEET_FORMAT") {
            let format: SheetFormat = fmt.parse()?;
            config.fundamentals.format = format;
            config.technical.format = format;
        }
        if let Some(ws) = lookup("HISSE_WORKSHEET") {
            let selector = WorksheetSelector::parse(&ws);
            config.fundamentals.worksheet = selector.clone();
            config.technical.worksheet = selector;
        }

        config.access_token = lookup("HISSE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(raw) = lookup("HISSE_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "HISSE_HTTP_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("HISSE_CATEGORICAL_THRESHOLD") {
            config.categorical_threshold = raw
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "HISSE_CATEGORICAL_THRESHOLD",
                    expected: "a positive number",
                    value: raw.clone(),
                })?;
        }
        if let Some(template) = lookup("HISSE_CHART_URL_TEMPLATE") {
            config.chart_url_template = template;
        }
        if let Some(dir) = lookup("HISSE_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}
