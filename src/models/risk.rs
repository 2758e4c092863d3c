use super::crop::StorageType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Pre-Harvest")]
    PreHarvest,
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::PreHarvest => "Pre-Harvest",
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "preharvest" => Some(RiskLevel::PreHarvest),
            "low" => Some(RiskLevel::Low),
            "moderate" | "medium" => Some(RiskLevel::Moderate),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    /// Band for a 0-100 spoilage score.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=30 => RiskLevel::Low,
            31..=60 => RiskLevel::Moderate,
            _ => RiskLevel::High,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display tag attached to each breakdown row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorSeverity {
    Good,
    Caution,
    Danger,
}

/// One row of the spoilage score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub points: u32,
    pub detail: String,
    pub is_penalty: bool,
    pub severity: FactorSeverity,
}

impl RiskFactor {
    pub fn penalty(
        name: &str,
        points: u32,
        detail: impl Into<String>,
        severity: FactorSeverity,
    ) -> Self {
        Self {
            name: name.to_string(),
            points,
            detail: detail.into(),
            is_penalty: true,
            severity,
        }
    }

    /// A zero-point row explaining why a factor did not contribute.
    pub fn clear(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            points: 0,
            detail: detail.into(),
            is_penalty: false,
            severity: FactorSeverity::Good,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageRecommendation {
    pub storage_type: StorageType,
    pub description: &'static str,
    pub icon: &'static str,
    pub tips: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub factors: Vec<RiskFactor>,
    /// Clamped to 0-100
    pub score: u32,
    pub level: RiskLevel,
    /// Set only for crops whose harvest date is still ahead
    pub days_to_harvest: Option<i64>,
    pub days_since_harvest: i64,
    pub shelf_life_remaining: i64,
    pub storage: StorageRecommendation,
}

/// A persisted record of one spoilage assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskHistoryRecord {
    pub id: Option<i64>,
    pub crop_instance_id: String,
    pub crop_name: String,
    pub risk_percentage: u32,
    pub risk_level: RiskLevel,
    pub storage_type: StorageType,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_band_edges() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(31), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(60), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(61), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn risk_level_from_str() {
        assert_eq!(RiskLevel::from_str("Pre-Harvest"), Some(RiskLevel::PreHarvest));
        assert_eq!(RiskLevel::from_str("HIGH"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_str("extreme"), None);
    }

    #[test]
    fn pre_harvest_serializes_with_hyphen() {
        let json = serde_json::to_string(&RiskLevel::PreHarvest).unwrap();
        assert_eq!(json, "\"Pre-Harvest\"");
    }
}
