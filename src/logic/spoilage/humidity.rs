use super::{RiskFactorRule, SpoilageContext};
use crate::models::{FactorSeverity, MoistureSensitivity, RiskFactor};

pub const HUMIDITY_THRESHOLD_PERCENT: f64 = 75.0;

/// High ambient humidity, weighted by how moisture-sensitive the crop is.
///
/// Points above 75% humidity:
/// - High sensitivity: 25
/// - Medium sensitivity: 15
/// - Low sensitivity: 5
pub struct HumidityFactor;

impl HumidityFactor {
    fn points(sensitivity: MoistureSensitivity) -> u32 {
        match sensitivity {
            MoistureSensitivity::High => 25,
            MoistureSensitivity::Medium => 15,
            MoistureSensitivity::Low => 5,
        }
    }
}

impl RiskFactorRule for HumidityFactor {
    fn id(&self) -> &'static str {
        "humidity"
    }

    fn name(&self) -> &'static str {
        "Humidity"
    }

    fn evaluate(&self, ctx: &SpoilageContext) -> Option<RiskFactor> {
        let humidity = ctx.weather.humidity_percent;
        let sensitivity = ctx.crop.moisture_sensitivity;

        if humidity <= HUMIDITY_THRESHOLD_PERCENT {
            return Some(RiskFactor::clear(
                self.name(),
                format!(
                    "{:.0}% humidity is at or below the {:.0}% threshold",
                    humidity, HUMIDITY_THRESHOLD_PERCENT
                ),
            ));
        }

        let severity = match sensitivity {
            MoistureSensitivity::High => FactorSeverity::Danger,
            _ => FactorSeverity::Caution,
        };

        Some(RiskFactor::penalty(
            self.name(),
            Self::points(sensitivity),
            format!(
                "{:.0}% humidity with {} moisture sensitivity",
                humidity, sensitivity
            ),
            severity,
        ))
    }
}
