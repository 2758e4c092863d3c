use crate::models::{CropReference, FarmContext};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const STRICT_LIMIT: usize = 5;
pub const FALLBACK_LIMIT: usize = 3;

const SOIL_POINTS: f64 = 40.0;
const SEASON_POINTS: f64 = 30.0;
const TEMPERATURE_POINTS: f64 = 20.0;
const REGION_POINTS: f64 = 10.0;

/// A ranked sowing suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct CropSuggestion {
    pub crop: CropReference,
    pub score: f64,
    pub soil_match: bool,
    pub season_match: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuitabilityResult {
    pub suggestions: Vec<CropSuggestion>,
    /// True when nothing passed the strict filter and constraints were relaxed
    pub used_fallback: bool,
}

/// Rank catalog crops for a farm.
///
/// The strict pass requires area, temperature and sowing month to fit and
/// returns the top 5. If nothing survives, a fallback pass keeps only the
/// sowing-month constraint and returns the top 3.
pub fn filter_crops_for_farm(farm: &FarmContext, catalog: &[CropReference]) -> SuitabilityResult {
    let strict: Vec<&CropReference> = catalog
        .iter()
        .filter(|crop| area_fits(farm, crop) && temperature_fits(farm, crop) && month_fits(farm, crop))
        .collect();

    if !strict.is_empty() {
        return SuitabilityResult {
            suggestions: rank(farm, strict, STRICT_LIMIT),
            used_fallback: false,
        };
    }

    tracing::debug!(
        soil = %farm.soil_type,
        month = farm.month,
        "No crops passed the strict filter, relaxing constraints"
    );

    let relaxed: Vec<&CropReference> = catalog.iter().filter(|crop| month_fits(farm, crop)).collect();

    SuitabilityResult {
        suggestions: rank(farm, relaxed, FALLBACK_LIMIT),
        used_fallback: true,
    }
}

fn rank(farm: &FarmContext, crops: Vec<&CropReference>, limit: usize) -> Vec<CropSuggestion> {
    let mut scored: Vec<CropSuggestion> = crops.into_iter().map(|crop| score_crop(farm, crop)).collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Score one crop against the farm. Maximum is 100.
pub fn score_crop(farm: &FarmContext, crop: &CropReference) -> CropSuggestion {
    let soil_match = crop
        .suitable_soils
        .iter()
        .any(|soil| normalize(soil) == normalize(&farm.soil_type));
    let season_match = crop.is_sowing_month(farm.month);
    let region_match = farm.region.as_deref().is_some_and(|region| {
        crop.region_tags
            .iter()
            .any(|tag| normalize(tag) == normalize(region))
    });

    let mut score = 0.0;
    if soil_match {
        score += SOIL_POINTS;
    }
    if season_match {
        score += SEASON_POINTS;
    }
    if let Some(temp) = farm.temperature_c {
        score += temperature_closeness(temp, crop.optimal_temp_min, crop.optimal_temp_max);
    }
    if region_match {
        score += REGION_POINTS;
    }

    CropSuggestion {
        crop: crop.clone(),
        score,
        soil_match,
        season_match,
    }
}

/// Up to 20 points, falling linearly from the middle of the range to 0 at its edges.
fn temperature_closeness(temp: f64, min: f64, max: f64) -> f64 {
    let half_range = (max - min) / 2.0;
    let mid = min + half_range;

    if half_range <= 0.0 {
        return if (temp - mid).abs() < f64::EPSILON {
            TEMPERATURE_POINTS
        } else {
            0.0
        };
    }

    TEMPERATURE_POINTS * (1.0 - (temp - mid).abs() / half_range).max(0.0)
}

fn area_fits(farm: &FarmContext, crop: &CropReference) -> bool {
    match (farm.area_hectares, crop.min_area_hectares) {
        (Some(area), Some(min)) => area >= min,
        _ => true,
    }
}

fn temperature_fits(farm: &FarmContext, crop: &CropReference) -> bool {
    farm.temperature_c
        .map(|t| t >= crop.optimal_temp_min && t <= crop.optimal_temp_max)
        .unwrap_or(true)
}

/// Crops without sowing-month data are never excluded by season.
fn month_fits(farm: &FarmContext, crop: &CropReference) -> bool {
    crop.ideal_sowing_months.is_empty() || crop.is_sowing_month(farm.month)
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Today if this month is an ideal sowing month, otherwise the first day of
/// the nearest upcoming ideal month (wrapping into next year).
pub fn sowing_date(crop: &CropReference, today: NaiveDate) -> NaiveDate {
    let current = today.month();
    if crop.ideal_sowing_months.is_empty() || crop.is_sowing_month(current) {
        return today;
    }

    let next = crop
        .ideal_sowing_months
        .iter()
        .filter(|m| (1..=12).contains(*m))
        .map(|&m| {
            let ahead = (m + 12 - current) % 12;
            (ahead, m)
        })
        .min_by_key(|(ahead, _)| *ahead);

    let Some((_, month)) = next else {
        return today;
    };

    let year = if month < current {
        today.year() + 1
    } else {
        today.year()
    };

    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
}
