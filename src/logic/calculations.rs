use crate::models::RiskLevel;
use chrono::NaiveDate;

/// Whole days from `from` to `to`; negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Fraction of the shelf-life window already elapsed since harvest.
/// A zero-day shelf life counts as fully used once any day has passed.
pub fn shelf_life_usage(days_since_harvest: i64, shelf_life_days: u32) -> f64 {
    if shelf_life_days == 0 {
        return if days_since_harvest > 0 { 1.0 } else { 0.0 };
    }
    days_since_harvest as f64 / shelf_life_days as f64
}

/// Coarse market pressure from shelf-life usage.
pub fn market_risk_score(usage: f64) -> f64 {
    if usage > 1.0 {
        0.8
    } else if usage > 0.7 {
        0.4
    } else {
        0.1
    }
}

/// Spoilage fraction (score / 100) plus market fraction.
pub fn total_risk(risk_percentage: u32, market_risk: f64) -> f64 {
    risk_percentage as f64 / 100.0 + market_risk
}

/// Band for the combined score. Intentionally coarser than the 0-100
/// spoilage bands.
pub fn classify_total_risk(total: f64) -> RiskLevel {
    if total < 1.0 {
        RiskLevel::Low
    } else if total <= 1.5 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}
