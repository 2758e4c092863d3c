use super::{RiskFactorRule, SpoilageContext};
use crate::logic::calculations::shelf_life_usage;
use crate::models::{FactorSeverity, RiskFactor};

pub const EXCEEDED_POINTS: u32 = 40;
pub const NEARING_END_POINTS: u32 = 20;
pub const NEARING_END_PERCENT: f64 = 70.0;

/// How much of the shelf-life window has elapsed since harvest.
pub struct ShelfLifeFactor;

impl RiskFactorRule for ShelfLifeFactor {
    fn id(&self) -> &'static str {
        "shelf_life"
    }

    fn name(&self) -> &'static str {
        "Shelf Life"
    }

    fn evaluate(&self, ctx: &SpoilageContext) -> Option<RiskFactor> {
        let days = ctx.days_since_harvest;
        let shelf_life = ctx.crop.shelf_life_days as i64;
        let used_pct = shelf_life_usage(days, ctx.crop.shelf_life_days) * 100.0;

        let factor = if days > shelf_life {
            RiskFactor::penalty(
                self.name(),
                EXCEEDED_POINTS,
                format!("Exceeded shelf life by {} days", days - shelf_life),
                FactorSeverity::Danger,
            )
        } else if used_pct > NEARING_END_PERCENT {
            RiskFactor::penalty(
                self.name(),
                NEARING_END_POINTS,
                format!("{:.0}% of shelf life used", used_pct),
                FactorSeverity::Caution,
            )
        } else {
            RiskFactor::clear(self.name(), format!("{:.0}% used", used_pct))
        };

        Some(factor)
    }
}
