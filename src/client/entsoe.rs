use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};

use super::PriceSource;
use super::document::parse_document;
use crate::areas::AreaConfig;
use crate::config::EntsoeConfig;
use crate::error::{EntsoeError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::prices::PriceSeries;

/// Day-ahead prices document
const DOCUMENT_TYPE: &str = "A44";
/// Daily contract
const CONTRACT_TYPE: &str = "A01";
const PERIOD_FORMAT: &str = "%Y%m%d%H%M";

/// HTTP client for the ENTSO-e Transparency Platform REST API
pub struct EntsoeClient {
    http: reqwest::Client,
    api_url: String,
    logger: StructuredLogger,
}

impl EntsoeClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EntsoeError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            logger: get_logger_with_context(LogContext::new("client")),
        })
    }

    pub fn from_config(cfg: &EntsoeConfig) -> Result<Self> {
        Self::new(
            cfg.api_url.clone(),
            Duration::from_secs(cfg.request_timeout_secs),
        )
    }

    fn query_params(
        area: &AreaConfig,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("securityToken", area.api_key.clone()),
            ("documentType", DOCUMENT_TYPE.to_string()),
            ("in_Domain", area.area.eic.to_string()),
            ("out_Domain", area.area.eic.to_string()),
            ("periodStart", start.format(PERIOD_FORMAT).to_string()),
            ("periodEnd", end.format(PERIOD_FORMAT).to_string()),
            ("contract_MarketAgreement.type", CONTRACT_TYPE.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl PriceSource for EntsoeClient {
    async fn fetch(
        &self,
        area: &AreaConfig,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        self.logger.debug(&format!(
            "Querying day-ahead prices for {} ({}) from {} to {}",
            area.area.key,
            area.area.code,
            start.format(PERIOD_FORMAT),
            end.format(PERIOD_FORMAT)
        ));

        let resp = self
            .http
            .get(&self.api_url)
            .header(USER_AGENT, format!("entsoe/{}", env!("APP_VERSION")))
            .header(ACCEPT, "application/xml")
            .query(&Self::query_params(area, start, end))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(EntsoeError::auth("Unauthorized: please check your API key"));
        }

        let body = resp.text().await?;
        let parsed = tokio::task::spawn_blocking(move || parse_document(&body))
            .await
            .map_err(|e| EntsoeError::transport(format!("document parser task failed: {}", e)))?;

        if !status.is_success() {
            // The platform answers "no data" with an acknowledgement and a 4xx status
            return match parsed {
                Err(err @ EntsoeError::NoData { .. }) => Err(err),
                _ => Err(EntsoeError::transport(format!(
                    "unexpected HTTP status {}",
                    status
                ))),
            };
        }

        let series = parsed?;
        self.logger
            .debug(&format!("Received {} hourly prices", series.len()));
        Ok(series)
    }
}
