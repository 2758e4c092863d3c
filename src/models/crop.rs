use super::advisory::Advisory;
use super::prediction::PriceTrend;
use super::risk::RiskLevel;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoistureSensitivity {
    Low,
    Medium,
    High,
}

impl MoistureSensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoistureSensitivity::Low => "Low",
            MoistureSensitivity::Medium => "Medium",
            MoistureSensitivity::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(MoistureSensitivity::Low),
            "medium" | "moderate" => Some(MoistureSensitivity::Medium),
            "high" => Some(MoistureSensitivity::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for MoistureSensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    Dry,
    Cold,
    Ventilated,
    Normal,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Dry => "Dry",
            StorageType::Cold => "Cold",
            StorageType::Ventilated => "Ventilated",
            StorageType::Normal => "Normal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dry" => Some(StorageType::Dry),
            "cold" | "cold storage" => Some(StorageType::Cold),
            "ventilated" => Some(StorageType::Ventilated),
            "normal" | "ambient" => Some(StorageType::Normal),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrigationType {
    Drip,
    Sprinkler,
    Flood,
    Rainfed,
}

impl IrrigationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrigationType::Drip => "Drip",
            IrrigationType::Sprinkler => "Sprinkler",
            IrrigationType::Flood => "Flood/Canal",
            IrrigationType::Rainfed => "Rainfed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "drip" => Some(IrrigationType::Drip),
            "sprinkler" => Some(IrrigationType::Sprinkler),
            "flood" | "canal" | "flood/canal" => Some(IrrigationType::Flood),
            "rainfed" | "rain-fed" | "none" => Some(IrrigationType::Rainfed),
            _ => None,
        }
    }
}

impl std::fmt::Display for IrrigationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Master catalog record for a crop. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropReference {
    pub id: String,
    pub name: String,
    pub growth_duration_days: u32,
    /// Optimal storage temperature range, °C
    pub optimal_temp_min: f64,
    pub optimal_temp_max: f64,
    pub moisture_sensitivity: MoistureSensitivity,
    pub shelf_life_days: u32,
    /// Unknown storage types are kept as `None` and treated as `Normal`
    pub storage_type: Option<StorageType>,
    /// Calendar months 1-12
    pub ideal_sowing_months: Vec<u32>,
    pub suitable_soils: Vec<String>,
    pub region_tags: Vec<String>,
    pub min_area_hectares: Option<f64>,
}

impl CropReference {
    pub fn storage_or_default(&self) -> StorageType {
        self.storage_type.unwrap_or(StorageType::Normal)
    }

    pub fn is_sowing_month(&self, month: u32) -> bool {
        self.ideal_sowing_months.contains(&month)
    }
}

/// Lifecycle stage of a planted crop relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestStatus {
    Growing,
    ApproachingHarvest,
    ReadyForHarvest,
    PostHarvest,
}

impl HarvestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestStatus::Growing => "growing",
            HarvestStatus::ApproachingHarvest => "approaching_harvest",
            HarvestStatus::ReadyForHarvest => "ready_for_harvest",
            HarvestStatus::PostHarvest => "post_harvest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "growing" => Some(HarvestStatus::Growing),
            "approaching_harvest" => Some(HarvestStatus::ApproachingHarvest),
            "ready_for_harvest" => Some(HarvestStatus::ReadyForHarvest),
            "post_harvest" => Some(HarvestStatus::PostHarvest),
            _ => None,
        }
    }

    /// Ready and post-harvest crops get the full risk + market assessment.
    pub fn is_harvest_relevant(&self) -> bool {
        matches!(
            self,
            HarvestStatus::ReadyForHarvest | HarvestStatus::PostHarvest
        )
    }
}

impl std::fmt::Display for HarvestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A crop planted by a farmer. The computed fields are written only by the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropInstance {
    pub id: String,
    pub reference_id: String,
    pub name: String,
    pub sowing_date: NaiveDate,
    pub harvest_date: Option<NaiveDate>,
    pub irrigation_type: Option<IrrigationType>,
    pub harvest_status: Option<HarvestStatus>,
    pub risk_level: Option<RiskLevel>,
    /// Spoilage score, 0-100
    pub risk_percentage: Option<u32>,
    /// Spoilage fraction plus market fraction
    pub total_risk: Option<f64>,
    pub shelf_life_remaining: Option<i64>,
    pub advisory: Option<Advisory>,
    pub price_trend: Option<PriceTrend>,
}

impl CropInstance {
    /// Plant `reference` on `sowing_date`; harvest is predicted from the
    /// growth duration.
    pub fn plant(
        reference: &CropReference,
        sowing_date: NaiveDate,
        irrigation_type: Option<IrrigationType>,
    ) -> Self {
        let harvest_date = sowing_date + Duration::days(reference.growth_duration_days as i64);
        Self {
            id: format!("{}-{}", reference.id, Utc::now().timestamp_millis()),
            reference_id: reference.id.clone(),
            name: reference.name.clone(),
            sowing_date,
            harvest_date: Some(harvest_date),
            irrigation_type,
            harvest_status: None,
            risk_level: None,
            risk_percentage: None,
            total_risk: None,
            shelf_life_remaining: None,
            advisory: None,
            price_trend: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn tomato() -> CropReference {
        CropReference {
            id: "tomato".into(),
            name: "Tomato".into(),
            growth_duration_days: 90,
            optimal_temp_min: 10.0,
            optimal_temp_max: 30.0,
            moisture_sensitivity: MoistureSensitivity::High,
            shelf_life_days: 20,
            storage_type: Some(StorageType::Cold),
            ideal_sowing_months: vec![6, 7, 11],
            suitable_soils: vec!["Loamy".into(), "Sandy Loam".into()],
            region_tags: vec!["Maharashtra".into()],
            min_area_hectares: Some(0.5),
        }
    }
}
