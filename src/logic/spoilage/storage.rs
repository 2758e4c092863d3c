use crate::models::{StorageRecommendation, StorageType};

/// Care guidance per storage type. Missing types use `Normal`.
pub fn storage_recommendation(storage_type: Option<StorageType>) -> StorageRecommendation {
    match storage_type.unwrap_or(StorageType::Normal) {
        StorageType::Dry => StorageRecommendation {
            storage_type: StorageType::Dry,
            description: "Keep in a cool, dry, well-sealed store away from ground moisture",
            icon: "warehouse",
            tips: &[
                "Dry produce to safe moisture levels before bagging",
                "Stack bags on pallets, not directly on the floor",
                "Inspect weekly for insects and fungal growth",
                "Keep the store closed during humid or rainy spells",
            ],
        },
        StorageType::Cold => StorageRecommendation {
            storage_type: StorageType::Cold,
            description: "Move to cold storage and keep within the optimal temperature band",
            icon: "snowflake",
            tips: &[
                "Pre-cool produce soon after harvest",
                "Avoid temperature swings when loading and unloading",
                "Separate damaged produce to slow spread of rot",
            ],
        },
        StorageType::Ventilated => StorageRecommendation {
            storage_type: StorageType::Ventilated,
            description: "Store in a shaded, well-ventilated structure with steady airflow",
            icon: "wind",
            tips: &[
                "Spread produce in thin layers or open crates",
                "Keep air moving around and under the stack",
                "Remove sprouting or soft produce promptly",
            ],
        },
        StorageType::Normal => StorageRecommendation {
            storage_type: StorageType::Normal,
            description: "Store in a clean, shaded place at ambient conditions",
            icon: "box",
            tips: &[
                "Keep out of direct sun and rain",
                "Use clean, dry containers",
                "Sell or process before quality declines",
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_three_or_four_tips() {
        for storage in [
            StorageType::Dry,
            StorageType::Cold,
            StorageType::Ventilated,
            StorageType::Normal,
        ] {
            let rec = storage_recommendation(Some(storage));
            assert_eq!(rec.storage_type, storage);
            assert!((3..=4).contains(&rec.tips.len()));
        }
    }

    #[test]
    fn missing_type_uses_normal() {
        assert_eq!(storage_recommendation(None).storage_type, StorageType::Normal);
    }
}
