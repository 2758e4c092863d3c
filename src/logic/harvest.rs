use super::calculations::days_between;
use crate::models::HarvestStatus;
use chrono::NaiveDate;

/// Days left until harvest; negative once the harvest date has passed.
pub fn days_to_harvest(harvest_date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    harvest_date.map(|date| days_between(today, date))
}

/// Lifecycle stage of a crop relative to `today`.
pub fn classify(harvest_date: Option<NaiveDate>, today: NaiveDate) -> HarvestStatus {
    match days_to_harvest(harvest_date, today) {
        None => HarvestStatus::Growing,
        Some(days) => classify_days(days),
    }
}

pub fn classify_days(days_to_harvest: i64) -> HarvestStatus {
    match days_to_harvest {
        d if d > 7 => HarvestStatus::Growing,
        1..=7 => HarvestStatus::ApproachingHarvest,
        -7..=0 => HarvestStatus::ReadyForHarvest,
        _ => HarvestStatus::PostHarvest,
    }
}
