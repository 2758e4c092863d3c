use crate::models::{Advisory, AdvisoryAction, PriceTrend, RiskLevel, Urgency};

/// Map a risk band and price trend to a recommended action.
///
/// A missing trend is read as stable.
pub fn generate(level: RiskLevel, trend: Option<PriceTrend>) -> Advisory {
    let trend = trend.unwrap_or_default();

    match (level, trend) {
        (RiskLevel::High, PriceTrend::Falling) => Advisory::new(
            AdvisoryAction::SellImmediately,
            Urgency::Critical,
            "High spoilage risk and prices are falling. Sell immediately to avoid losses.",
        ),
        (RiskLevel::High, _) => Advisory::new(
            AdvisoryAction::SellSoon,
            Urgency::High,
            "High spoilage risk. Sell within the next few days.",
        ),
        (RiskLevel::Low, PriceTrend::Rising) => Advisory::new(
            AdvisoryAction::Hold,
            Urgency::Low,
            "Low spoilage risk and prices are rising. Hold for a better price.",
        ),
        (RiskLevel::Low, _) => Advisory::new(
            AdvisoryAction::Hold,
            Urgency::Low,
            "Low spoilage risk. Storage conditions are safe to hold.",
        ),
        _ => Advisory::new(
            AdvisoryAction::Monitor,
            Urgency::Medium,
            "Moderate risk. Monitor storage conditions and market prices daily.",
        ),
    }
}

/// Advisory for a crop whose harvest is a few days out.
pub fn prepare(days_to_harvest: i64) -> Advisory {
    Advisory::new(
        AdvisoryAction::Prepare,
        Urgency::Info,
        format!(
            "Harvest in {} days. Arrange labour, transport and storage.",
            days_to_harvest
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_and_falling_sells_immediately() {
        let advisory = generate(RiskLevel::High, Some(PriceTrend::Falling));
        assert_eq!(advisory.action, AdvisoryAction::SellImmediately);
        assert_eq!(advisory.urgency, Urgency::Critical);
    }

    #[test]
    fn high_with_other_trends_sells_soon() {
        for trend in [Some(PriceTrend::Rising), Some(PriceTrend::Stable), None] {
            let advisory = generate(RiskLevel::High, trend);
            assert_eq!(advisory.action, AdvisoryAction::SellSoon);
            assert_eq!(advisory.urgency, Urgency::High);
        }
    }

    #[test]
    fn low_and_rising_holds_with_rising_message() {
        let rising = generate(RiskLevel::Low, Some(PriceTrend::Rising));
        let stable = generate(RiskLevel::Low, Some(PriceTrend::Stable));

        assert_eq!(rising.action, AdvisoryAction::Hold);
        assert_eq!(rising.urgency, Urgency::Low);
        assert!(rising.message.contains("rising"));

        assert_eq!(stable.action, AdvisoryAction::Hold);
        assert_ne!(rising.message, stable.message);
    }

    #[test]
    fn moderate_always_monitors() {
        for trend in [PriceTrend::Rising, PriceTrend::Falling, PriceTrend::Stable] {
            let advisory = generate(RiskLevel::Moderate, Some(trend));
            assert_eq!(advisory.action, AdvisoryAction::Monitor);
            assert_eq!(advisory.urgency, Urgency::Medium);
        }
    }

    #[test]
    fn pre_harvest_level_falls_through_to_monitor() {
        let advisory = generate(RiskLevel::PreHarvest, None);
        assert_eq!(advisory.action, AdvisoryAction::Monitor);
    }

    #[test]
    fn prepare_interpolates_days() {
        let advisory = prepare(4);
        assert_eq!(advisory.action, AdvisoryAction::Prepare);
        assert_eq!(advisory.urgency, Urgency::Info);
        assert!(advisory.message.contains("4 days"));
    }
}
