use super::{
    humidity::HumidityFactor, rainfall::RainfallFactor, shelf_life::ShelfLifeFactor,
    storage::storage_recommendation, temperature::TemperatureFactor, RiskFactorRule,
    SpoilageContext,
};
use crate::logic::calculations::days_between;
use crate::models::{CropReference, RiskAssessment, RiskLevel, WeatherSnapshot};
use chrono::NaiveDate;

pub const MAX_SCORE: u32 = 100;

/// Deterministic 0-100 spoilage score for a harvested crop.
pub struct SpoilageRiskScorer {
    factors: Vec<Box<dyn RiskFactorRule>>,
}

impl SpoilageRiskScorer {
    pub fn new() -> Self {
        // Breakdown rows come out in this order
        let factors: Vec<Box<dyn RiskFactorRule>> = vec![
            Box::new(TemperatureFactor),
            Box::new(HumidityFactor),
            Box::new(ShelfLifeFactor),
            Box::new(RainfallFactor),
        ];

        Self { factors }
    }

    /// Score `crop` harvested on `harvest_date`. Missing weather falls back to
    /// 25°C / 50% / 0mm.
    pub fn assess(
        &self,
        crop: &CropReference,
        harvest_date: NaiveDate,
        weather: Option<&WeatherSnapshot>,
        today: NaiveDate,
    ) -> RiskAssessment {
        let days_since_harvest = days_between(harvest_date, today);
        let storage = storage_recommendation(crop.storage_type);
        let shelf_life = crop.shelf_life_days as i64;

        if days_since_harvest < 0 {
            return RiskAssessment {
                factors: Vec::new(),
                score: 0,
                level: RiskLevel::PreHarvest,
                days_to_harvest: Some(-days_since_harvest),
                days_since_harvest,
                shelf_life_remaining: shelf_life,
                storage,
            };
        }

        let fallback = WeatherSnapshot::default();
        let ctx = SpoilageContext {
            crop,
            weather: weather.unwrap_or(&fallback),
            days_since_harvest,
        };

        let factors: Vec<_> = self
            .factors
            .iter()
            .filter_map(|factor| {
                let row = factor.evaluate(&ctx);
                if let Some(ref r) = row {
                    tracing::trace!(factor = factor.id(), points = r.points, "Spoilage factor applied");
                }
                row
            })
            .collect();

        let raw: u32 = factors.iter().map(|f| f.points).sum();
        let score = raw.min(MAX_SCORE);

        RiskAssessment {
            factors,
            score,
            level: RiskLevel::from_score(score),
            days_to_harvest: None,
            days_since_harvest,
            shelf_life_remaining: (shelf_life - days_since_harvest).max(0),
            storage,
        }
    }
}

impl Default for SpoilageRiskScorer {
    fn default() -> Self {
        Self::new()
    }
}
