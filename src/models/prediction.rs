use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How long a cached prediction may be served without asking the service again.
pub const PREDICTION_FRESHNESS_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Rising,
    Falling,
    #[default]
    Stable,
}

impl PriceTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTrend::Rising => "rising",
            PriceTrend::Falling => "falling",
            PriceTrend::Stable => "stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            PriceTrend::Rising => "↑",
            PriceTrend::Falling => "↓",
            PriceTrend::Stable => "→",
        }
    }

    /// Anything outside the enumerated set is read as `Stable`.
    pub fn coerce(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "rising" => PriceTrend::Rising,
            "falling" => PriceTrend::Falling,
            _ => PriceTrend::Stable,
        }
    }
}

impl std::fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the prediction service answers for a crop and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub crop_id: String,
    pub target_date: NaiveDate,
    pub predicted_price: f64,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub trend: PriceTrend,
}

/// A cached estimate, keyed by crop, date and farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub crop_id: String,
    pub target_date: NaiveDate,
    pub user_id: String,
    pub predicted_price: f64,
    pub confidence: f64,
    pub trend: PriceTrend,
    pub created_at: DateTime<Utc>,
}

impl PricePrediction {
    pub fn from_estimate(estimate: PriceEstimate, user_id: &str) -> Self {
        Self {
            crop_id: estimate.crop_id,
            target_date: estimate.target_date,
            user_id: user_id.to_string(),
            predicted_price: estimate.predicted_price,
            confidence: estimate.confidence,
            trend: estimate.trend,
            created_at: Utc::now(),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < Duration::hours(PREDICTION_FRESHNESS_HOURS)
    }
}
