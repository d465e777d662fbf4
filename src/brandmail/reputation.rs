// SPDX-License-Identifier: MIT

//! URL reputation checks against VirusTotal
//!
//! A URL is submitted once, its analysis fetched once, and the risk score is
//! the number of engines flagging it as malicious or suspicious.

use super::error::ReputationError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use url::Url;

/// Returns a risk score for a URL; anything above zero is risky
#[async_trait]
pub trait ReputationChecker: Send + Sync {
    async fn check(&self, url: &str) -> Result<u64, ReputationError>;
}

/// Detection counts reported for an analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AnalysisStats {
    pub malicious: u64,
    pub suspicious: u64,
    #[serde(default)]
    pub harmless: u64,
    #[serde(default)]
    pub undetected: u64,
}

impl AnalysisStats {
    pub fn risk_score(&self) -> u64 {
        self.malicious + self.suspicious
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data: SubmitData,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    data: AnalysisData,
}

#[derive(Debug, Deserialize)]
struct AnalysisData {
    attributes: AnalysisAttributes,
}

#[derive(Debug, Deserialize)]
struct AnalysisAttributes {
    stats: AnalysisStats,
}

pub struct VirusTotalClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl VirusTotalClient {
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, ReputationError> {
        // Joining relative paths needs a trailing slash on the base
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url,
        })
    }

    /// Submit a URL for analysis and return the analysis id
    pub async fn submit(&self, url: &str) -> Result<String, ReputationError> {
        let endpoint = self.base_url.join("urls")?;

        let resp = self
            .client
            .post(endpoint)
            .header("accept", "application/json")
            .header("x-apikey", &self.api_key)
            .form(&[("url", url)])
            .send()
            .await?;

        let body = Self::read_json(resp).await?;
        let submitted: SubmitResponse = serde_json::from_value(body)
            .map_err(|e| ReputationError::Malformed(format!("submit response: {}", e)))?;

        Ok(submitted.data.id)
    }

    /// Fetch the analysis stats for a previous submission
    pub async fn fetch_analysis(&self, analysis_id: &str) -> Result<AnalysisStats, ReputationError> {
        let endpoint = self.base_url.join("analyses/")?.join(analysis_id)?;

        let resp = self
            .client
            .get(endpoint)
            .header("accept", "application/json")
            .header("x-apikey", &self.api_key)
            .send()
            .await?;

        let body = Self::read_json(resp).await?;
        parse_analysis(body)
    }

    async fn read_json(resp: Response) -> Result<serde_json::Value, ReputationError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await?;
            return Err(ReputationError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }
}

fn parse_analysis(body: serde_json::Value) -> Result<AnalysisStats, ReputationError> {
    let analysis: AnalysisResponse = serde_json::from_value(body)
        .map_err(|e| ReputationError::Malformed(format!("analysis response: {}", e)))?;
    Ok(analysis.data.attributes.stats)
}

#[async_trait]
impl ReputationChecker for VirusTotalClient {
    async fn check(&self, url: &str) -> Result<u64, ReputationError> {
        let analysis_id = self.submit(url).await?;
        log::debug!("Submitted {} for analysis: {}", url, analysis_id);

        let stats = self.fetch_analysis(&analysis_id).await?;
        log::info!(
            "Reputation for {}: malicious={}, suspicious={}",
            url,
            stats.malicious,
            stats.suspicious
        );

        Ok(stats.risk_score())
    }
}
