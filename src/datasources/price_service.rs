use crate::config::PredictionConfig;
use crate::error::{HarvestWiseError, PredictionError, Result};
use crate::logic::prediction::{PredictionTransport, TransportResponse};
use async_trait::async_trait;
use serde::Deserialize;

/// HTTP transport to the market price prediction service.
pub struct PriceServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommoditiesResponse {
    #[serde(default)]
    commodities: Vec<String>,
}

impl PriceServiceClient {
    pub fn new(config: &PredictionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Commodities the service can price; also used as a reachability probe.
    pub async fn commodities(&self) -> Result<Vec<String>> {
        let url = format!("{}/commodities/", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HarvestWiseError::DataSourceUnavailable(format!(
                "Prediction service returned {}",
                response.status()
            )));
        }

        let body: CommoditiesResponse = response.json().await?;
        Ok(body.commodities)
    }

    pub async fn test_connection(&self) -> bool {
        self.commodities().await.is_ok()
    }
}

#[async_trait]
impl PredictionTransport for PriceServiceClient {
    async fn post_predict(
        &self,
        body: &serde_json::Value,
    ) -> std::result::Result<TransportResponse, PredictionError> {
        let url = format!("{}/predict", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PredictionError::Transport(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = PredictionConfig {
            base_url: "http://predict.local/".into(),
            api_key: None,
            timeout_secs: 15,
            max_attempts: 2,
            backoff_ms: 1000,
        };
        let client = PriceServiceClient::new(&config);
        assert_eq!(client.base_url, "http://predict.local");
    }
}
