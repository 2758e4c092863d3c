use super::prediction::PredictionClient;
use crate::error::Result;
use crate::models::PricePrediction;
use crate::stores::PredictionCache;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Cache-first access to price predictions.
pub struct MarketPriceService {
    client: PredictionClient,
    cache: Arc<dyn PredictionCache>,
}

impl MarketPriceService {
    pub fn new(client: PredictionClient, cache: Arc<dyn PredictionCache>) -> Self {
        Self { client, cache }
    }

    /// A fresh cached prediction if one exists, otherwise a new one from the
    /// service, cached before returning. Prediction failures propagate.
    pub async fn price_for(
        &self,
        crop_id: &str,
        target_date: NaiveDate,
        user_id: &str,
    ) -> Result<PricePrediction> {
        if let Some(cached) = self.cache.get(crop_id, target_date, user_id)? {
            debug!(crop_id, %target_date, "Using cached price prediction");
            return Ok(cached);
        }

        let date = target_date.format("%Y-%m-%d").to_string();
        let estimate = self.client.predict(crop_id, &date).await?;

        info!(
            crop_id,
            %target_date,
            price = estimate.predicted_price,
            trend = %estimate.trend,
            "Fetched price prediction"
        );

        self.cache
            .upsert(&PricePrediction::from_estimate(estimate, user_id))
    }
}
