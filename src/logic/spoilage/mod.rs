pub mod engine;
pub mod humidity;
pub mod rainfall;
pub mod shelf_life;
pub mod storage;
pub mod temperature;

pub use engine::SpoilageRiskScorer;

use crate::models::{CropReference, RiskFactor, WeatherSnapshot};

/// Inputs shared by every spoilage factor for one crop.
pub struct SpoilageContext<'a> {
    pub crop: &'a CropReference,
    pub weather: &'a WeatherSnapshot,
    /// Never negative: pre-harvest crops are not scored
    pub days_since_harvest: i64,
}

/// Trait for spoilage risk factors
pub trait RiskFactorRule: Send + Sync {
    /// Unique identifier for this factor
    fn id(&self) -> &'static str;

    /// Label shown in the breakdown
    fn name(&self) -> &'static str;

    /// Produce a breakdown row, or `None` when the factor has nothing to report
    fn evaluate(&self, ctx: &SpoilageContext) -> Option<RiskFactor>;
}
