//! Client for the NBP (Narodowy Bank Polski) table A API.
//!
//! Table A publishes one mid rate per currency per business day; there is no
//! publication on weekends and holidays, which the API reports as 404.

use chrono::NaiveDate;
use reqwest::{StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// One fetched publication: the effective date plus the mid per code.
#[derive(Clone, Debug)]
pub(crate) struct NbpTable {
    pub(crate) date: NaiveDate,
    pub(crate) mids: Vec<(String, Decimal)>,
}

#[derive(Debug, Error)]
pub(crate) enum NbpError {
    #[error("no publication for the requested date")]
    NoPublication,
    #[error("unexpected upstream response: {0}")]
    Format(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableEntry {
    effective_date: NaiveDate,
    rates: Vec<TableRate>,
}

#[derive(Debug, Deserialize)]
struct TableRate {
    code: String,
    mid: Decimal,
}

#[derive(Clone, Debug)]
pub(crate) struct NbpClient {
    base_url: Url,
    http: reqwest::Client,
}

impl NbpClient {
    pub(crate) fn new(base_url: &str) -> Result<Self, NbpError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| NbpError::Format(format!("invalid base_url: {err}")))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    /// Fetches table A for a date, or the newest publication when `date` is
    /// `None`.
    pub(crate) async fn table_a(&self, date: Option<NaiveDate>) -> Result<NbpTable, NbpError> {
        let path = match date {
            Some(date) => format!("exchangerates/tables/A/{date}/"),
            None => "exchangerates/tables/A/".to_string(),
        };
        let endpoint = self
            .base_url
            .join(&path)
            .map_err(|err| NbpError::Format(format!("invalid endpoint: {err}")))?;

        let res = self
            .http
            .get(endpoint)
            .query(&[("format", "json")])
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Err(NbpError::NoPublication);
        }
        let res = res.error_for_status()?;

        let tables: Vec<TableEntry> = res.json().await?;
        let first = tables
            .into_iter()
            .next()
            .ok_or_else(|| NbpError::Format("empty table response".to_string()))?;

        Ok(NbpTable {
            date: first.effective_date,
            mids: first
                .rates
                .into_iter()
                .map(|rate| (rate.code, rate.mid))
                .collect(),
        })
    }
}
