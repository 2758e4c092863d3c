//! Repository interfaces injected into the advisory pipeline.
//!
//! `Database` implements every trait here (see `db::queries`); the
//! orchestrator only ever holds trait objects.

use crate::error::Result;
use crate::models::{CropInstance, CropReference, PricePrediction, RiskHistoryRecord, WeatherSnapshot};
use chrono::{DateTime, NaiveDate, Utc};

pub trait ReferenceCatalog: Send + Sync {
    fn list_all(&self) -> Result<Vec<CropReference>>;

    /// Case-insensitive exact match on the crop name.
    fn find_by_name(&self, name: &str) -> Result<Option<CropReference>>;
}

pub trait CropInstanceStore: Send + Sync {
    fn load(&self, user_id: &str) -> Result<Vec<CropInstance>>;

    /// Replaces the whole portfolio for `user_id`.
    fn save(&self, user_id: &str, crops: &[CropInstance]) -> Result<()>;
}

pub trait PredictionCache: Send + Sync {
    /// Returns `None` when absent or no longer fresh.
    fn get(
        &self,
        crop_id: &str,
        target_date: NaiveDate,
        user_id: &str,
    ) -> Result<Option<PricePrediction>>;

    fn upsert(&self, prediction: &PricePrediction) -> Result<PricePrediction>;
}

pub trait RiskHistoryStore: Send + Sync {
    fn append(&self, record: &RiskHistoryRecord) -> Result<()>;

    fn recent(&self, limit: usize) -> Result<Vec<RiskHistoryRecord>>;
}

pub trait IdempotencyCache: Send + Sync {
    fn get(&self, crop_id: &str) -> Result<Option<DateTime<Utc>>>;

    fn set(&self, crop_id: &str, processed_at: DateTime<Utc>) -> Result<()>;
}

pub trait WeatherCache: Send + Sync {
    fn last(&self) -> Result<Option<WeatherSnapshot>>;

    fn store(&self, snapshot: &WeatherSnapshot) -> Result<()>;
}
