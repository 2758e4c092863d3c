use super::{RiskFactorRule, SpoilageContext};
use crate::models::{FactorSeverity, RiskFactor};

pub const TEMPERATURE_POINTS: u32 = 30;

/// Storage temperature outside the crop's optimal range.
pub struct TemperatureFactor;

impl RiskFactorRule for TemperatureFactor {
    fn id(&self) -> &'static str {
        "temperature"
    }

    fn name(&self) -> &'static str {
        "Temperature"
    }

    fn evaluate(&self, ctx: &SpoilageContext) -> Option<RiskFactor> {
        let temp = ctx.weather.temperature_c;
        let (min, max) = (ctx.crop.optimal_temp_min, ctx.crop.optimal_temp_max);

        if temp < min || temp > max {
            Some(RiskFactor::penalty(
                self.name(),
                TEMPERATURE_POINTS,
                format!(
                    "{:.1}°C is outside the optimal {:.0}-{:.0}°C range",
                    temp, min, max
                ),
                FactorSeverity::Danger,
            ))
        } else {
            Some(RiskFactor::clear(
                self.name(),
                format!("{:.1}°C is within the optimal {:.0}-{:.0}°C range", temp, min, max),
            ))
        }
    }
}
