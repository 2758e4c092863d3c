use super::{RiskFactorRule, SpoilageContext};
use crate::models::{FactorSeverity, RiskFactor};

pub const HEAVY_RAIN_MM: f64 = 60.0;
pub const RAINFALL_POINTS: u32 = 10;

/// Heavy rain raises moisture around stored produce. Unlike the other
/// factors this one stays silent when there is nothing to flag.
pub struct RainfallFactor;

impl RiskFactorRule for RainfallFactor {
    fn id(&self) -> &'static str {
        "rainfall"
    }

    fn name(&self) -> &'static str {
        "Rainfall"
    }

    fn evaluate(&self, ctx: &SpoilageContext) -> Option<RiskFactor> {
        let rainfall = ctx.weather.rainfall_mm;
        if rainfall <= HEAVY_RAIN_MM {
            return None;
        }

        Some(RiskFactor::penalty(
            self.name(),
            RAINFALL_POINTS,
            format!("Heavy rainfall ({:.0}mm)", rainfall),
            FactorSeverity::Caution,
        ))
    }
}
