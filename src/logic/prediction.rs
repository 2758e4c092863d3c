use crate::config::PredictionConfig;
use crate::error::PredictionError;
use crate::models::{PriceEstimate, PriceTrend};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

type PredictionResult<T> = std::result::Result<T, PredictionError>;

/// Raw status and body returned by the prediction service.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// The wire call to the prediction service. Implemented over HTTP by
/// `PriceServiceClient`.
#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn post_predict(&self, body: &Value) -> PredictionResult<TransportResponse>;
}

/// Validated, retrying client for the price prediction service.
pub struct PredictionClient {
    transport: Box<dyn PredictionTransport>,
    timeout: Duration,
    max_attempts: u32,
    backoff: Duration,
}

impl PredictionClient {
    pub fn new(transport: Box<dyn PredictionTransport>, config: &PredictionConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            backoff: config.backoff(),
        }
    }

    /// Predict the price of `crop_id` on `target_date` (YYYY-MM-DD).
    pub async fn predict(&self, crop_id: &str, target_date: &str) -> PredictionResult<PriceEstimate> {
        self.predict_as_of(crop_id, target_date, Local::now().date_naive())
            .await
    }

    pub async fn predict_as_of(
        &self,
        crop_id: &str,
        target_date: &str,
        today: NaiveDate,
    ) -> PredictionResult<PriceEstimate> {
        let (crop_id, date) = validate(crop_id, target_date, today)?;
        let body = json!({
            "crop_id": crop_id,
            "target_date": date.format("%Y-%m-%d").to_string(),
        });

        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match self.attempt(&body, crop_id, date).await {
                Ok(estimate) => {
                    debug!(crop_id, attempt, "Price prediction received");
                    return Ok(estimate);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!(crop_id, attempt, error = %e, "Price prediction attempt failed");
                    last_error = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(PredictionError::Exhausted(self.max_attempts)))
    }

    async fn attempt(
        &self,
        body: &Value,
        crop_id: &str,
        target_date: NaiveDate,
    ) -> PredictionResult<PriceEstimate> {
        let response = tokio::time::timeout(self.timeout, self.transport.post_predict(body))
            .await
            .map_err(|_| PredictionError::Timeout(self.timeout.as_secs()))??;

        if !(200..300).contains(&response.status) {
            return Err(PredictionError::Upstream {
                status: response.status,
            });
        }

        parse_estimate(&response.body, crop_id, target_date)
    }
}

fn validate<'a>(
    crop_id: &'a str,
    target_date: &str,
    today: NaiveDate,
) -> PredictionResult<(&'a str, NaiveDate)> {
    let crop_id = crop_id.trim();
    if crop_id.is_empty() {
        return Err(PredictionError::Validation("crop_id is required".into()));
    }

    let target_date = target_date.trim();
    if target_date.is_empty() {
        return Err(PredictionError::Validation("target_date is required".into()));
    }

    let date = NaiveDate::parse_from_str(target_date, "%Y-%m-%d").map_err(|_| {
        PredictionError::Validation(format!("invalid target_date '{}'", target_date))
    })?;

    if date < today {
        return Err(PredictionError::Validation(format!(
            "target_date {} is in the past",
            date
        )));
    }

    Ok((crop_id, date))
}

fn parse_estimate(body: &str, crop_id: &str, target_date: NaiveDate) -> PredictionResult<PriceEstimate> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| PredictionError::Malformed(e.to_string()))?;

    let predicted_price = value
        .get("predicted_price")
        .or_else(|| value.get("predicted_modal_price"))
        .and_then(Value::as_f64)
        .ok_or_else(|| PredictionError::Malformed("missing numeric predicted_price".into()))?;

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let trend = value
        .get("trend")
        .and_then(Value::as_str)
        .map(PriceTrend::coerce)
        .unwrap_or_default();

    Ok(PriceEstimate {
        crop_id: crop_id.to_string(),
        target_date,
        predicted_price,
        confidence,
        trend,
    })
}


#[cfg(test)]
mod tests {
    use super::fakes::{config, ScriptedTransport, Step};
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    const OK_BODY: &str = r#"{"predicted_price": 2150.5, "confidence": 0.82, "trend": "rising"}"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn client(steps: Vec<Step>, backoff_ms: u64) -> (PredictionClient, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
        let transport = ScriptedTransport::new(steps);
        let calls = transport.calls.clone();
        (PredictionClient::new(Box::new(transport), &config(backoff_ms)), calls)
    }

    #[tokio::test]
    async fn successful_prediction() {
        let (client, calls) = client(vec![Step::Respond(200, OK_BODY)], 10);
        let estimate = client.predict_as_of("tomato", "2024-07-20", today()).await.unwrap();

        assert_eq!(estimate.crop_id, "tomato");
        assert_eq!(estimate.target_date, NaiveDate::from_ymd_opt(2024, 7, 20).unwrap());
        assert_eq!(estimate.predicted_price, 2150.5);
        assert_eq!(estimate.confidence, 0.82);
        assert_eq!(estimate.trend, PriceTrend::Rising);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_crop_id_makes_no_call() {
        let (client, calls) = client(vec![Step::Respond(200, OK_BODY)], 10);
        let err = client.predict_as_of("  ", "2024-07-20", today()).await.unwrap_err();

        assert!(matches!(err, PredictionError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn past_or_invalid_dates_are_not_retried() {
        let (client, calls) = client(vec![], 10);

        let past = client.predict_as_of("tomato", "2024-07-14", today()).await;
        let garbage = client.predict_as_of("tomato", "next tuesday", today()).await;
        let missing = client.predict_as_of("tomato", "", today()).await;

        for result in [past, garbage, missing] {
            assert!(matches!(result, Err(PredictionError::Validation(_))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn today_is_a_valid_target() {
        let (client, _) = client(vec![Step::Respond(200, OK_BODY)], 10);
        assert!(client.predict_as_of("tomato", "2024-07-15", today()).await.is_ok());
    }

    #[tokio::test]
    async fn rate_limited_then_success_waits_for_backoff() {
        let (client, calls) = client(
            vec![Step::Respond(429, "slow down"), Step::Respond(200, OK_BODY)],
            100,
        );

        let started = Instant::now();
        let estimate = client.predict_as_of("onion", "2024-08-01", today()).await.unwrap();

        assert_eq!(estimate.predicted_price, 2150.5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_attempts() {
        let (client, calls) = client(
            vec![Step::Respond(503, ""), Step::Respond(500, "")],
            5,
        );

        let err = client.predict_as_of("onion", "2024-08-01", today()).await.unwrap_err();
        assert_eq!(err, PredictionError::Upstream { status: 500 });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_bodies_are_retried() {
        let (client, calls) = client(
            vec![
                Step::Respond(200, "<html>oops</html>"),
                Step::Respond(200, r#"{"predicted_price": "n/a"}"#),
            ],
            5,
        );

        let err = client.predict_as_of("onion", "2024-08-01", today()).await.unwrap_err();
        assert!(matches!(err, PredictionError::Malformed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_then_success() {
        let (client, _) = client(vec![Step::Fail, Step::Respond(200, OK_BODY)], 5);
        assert!(client.predict_as_of("onion", "2024-08-01", today()).await.is_ok());
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let transport = ScriptedTransport::new(vec![Step::Hang]);
        let mut cfg = config(5);
        cfg.max_attempts = 1;
        let mut client = PredictionClient::new(Box::new(transport), &cfg);
        client.timeout = Duration::from_millis(50);

        let err = client.predict_as_of("onion", "2024-08-01", today()).await.unwrap_err();
        assert!(matches!(err, PredictionError::Timeout(_)));
    }

    #[test]
    fn defaults_and_aliases_in_response() {
        let date = today();
        let estimate = parse_estimate(r#"{"predicted_modal_price": 1200}"#, "rice", date).unwrap();
        assert_eq!(estimate.predicted_price, 1200.0);
        assert_eq!(estimate.confidence, 0.0);
        assert_eq!(estimate.trend, PriceTrend::Stable);

        let estimate =
            parse_estimate(r#"{"predicted_price": 10, "trend": "volatile"}"#, "rice", date).unwrap();
        assert_eq!(estimate.trend, PriceTrend::Stable);

        assert!(parse_estimate(r#"{"confidence": 0.5}"#, "rice", date).is_err());
    }
}
