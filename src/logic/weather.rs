use crate::error::Result;
use crate::models::{Coordinates, WeatherSnapshot, WeatherSource};
use crate::stores::WeatherCache;
use async_trait::async_trait;
use chrono::{Datelike, Local};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A live weather API.
#[async_trait]
pub trait LiveWeather: Send + Sync {
    async fn current(&self, coords: Coordinates) -> Result<WeatherSnapshot>;
}

/// Current conditions with three tiers: live API, last cached reading, then a
/// fixed seasonal estimate. Never fails.
pub struct WeatherProvider {
    live: Option<Box<dyn LiveWeather>>,
    cache: Arc<dyn WeatherCache>,
}

impl WeatherProvider {
    pub fn new(live: Option<Box<dyn LiveWeather>>, cache: Arc<dyn WeatherCache>) -> Self {
        if live.is_none() {
            info!("No live weather source configured - using cached or seasonal values");
        }
        Self { live, cache }
    }

    pub async fn current(&self, coords: Coordinates) -> WeatherSnapshot {
        if let Some(ref live) = self.live {
            match live.current(coords).await {
                Ok(snapshot) => {
                    if let Err(e) = self.cache.store(&snapshot) {
                        warn!("Failed to cache weather reading: {}", e);
                    }
                    return snapshot.with_source(WeatherSource::Live);
                }
                Err(e) => warn!("Live weather unavailable, falling back: {}", e),
            }
        }

        match self.cache.last() {
            Ok(Some(snapshot)) => {
                debug!(recorded = %snapshot.timestamp, "Using cached weather");
                return snapshot.with_source(WeatherSource::Cached);
            }
            Ok(None) => debug!("No cached weather reading"),
            Err(e) => warn!("Failed to read weather cache: {}", e),
        }

        seasonal_estimate(Local::now().month())
    }
}

/// Representative conditions for the winter, summer and monsoon seasons.
pub fn seasonal_estimate(month: u32) -> WeatherSnapshot {
    let (temp, humidity, rain, icon) = match month {
        3..=6 => (34.0, 40.0, 0.0, "01d"),
        7..=10 => (28.0, 85.0, 15.0, "10d"),
        // Nov-Feb, and anything out of range
        _ => (20.0, 55.0, 0.0, "02d"),
    };

    WeatherSnapshot::new(temp, humidity, rain)
        .with_icon(icon)
        .with_source(WeatherSource::Offline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::HarvestWiseError;

    struct FixedWeather(Option<WeatherSnapshot>);

    #[async_trait]
    impl LiveWeather for FixedWeather {
        async fn current(&self, _coords: Coordinates) -> Result<WeatherSnapshot> {
            self.0
                .clone()
                .ok_or_else(|| HarvestWiseError::DataSourceUnavailable("offline".into()))
        }
    }

    fn coords() -> Coordinates {
        Coordinates {
            latitude: 19.07,
            longitude: 72.88,
        }
    }

    #[tokio::test]
    async fn live_reading_is_cached() {
        let db = Database::open_in_memory().unwrap();
        let live = FixedWeather(Some(WeatherSnapshot::new(31.0, 70.0, 2.0)));
        let provider = WeatherProvider::new(Some(Box::new(live)), Arc::new(db.clone()));

        let snapshot = provider.current(coords()).await;

        assert_eq!(snapshot.source, WeatherSource::Live);
        assert_eq!(snapshot.temperature_c, 31.0);
        let cached = db.last().unwrap().unwrap();
        assert_eq!(cached.temperature_c, 31.0);
    }

    #[tokio::test]
    async fn falls_back_to_cache_when_live_fails() {
        let db = Database::open_in_memory().unwrap();
        db.store(&WeatherSnapshot::new(22.0, 60.0, 0.0)).unwrap();
        let provider = WeatherProvider::new(Some(Box::new(FixedWeather(None))), Arc::new(db));

        let snapshot = provider.current(coords()).await;

        assert_eq!(snapshot.source, WeatherSource::Cached);
        assert_eq!(snapshot.temperature_c, 22.0);
    }

    #[tokio::test]
    async fn falls_back_to_season_without_cache() {
        let db = Database::open_in_memory().unwrap();
        let provider = WeatherProvider::new(None, Arc::new(db));

        let snapshot = provider.current(coords()).await;
        assert_eq!(snapshot.source, WeatherSource::Offline);
    }

    #[test]
    fn seasonal_buckets() {
        for month in [11, 12, 1, 2] {
            assert_eq!(seasonal_estimate(month).temperature_c, 20.0);
        }
        for month in [3, 4, 5, 6] {
            assert_eq!(seasonal_estimate(month).temperature_c, 34.0);
        }
        for month in [7, 8, 9, 10] {
            let monsoon = seasonal_estimate(month);
            assert_eq!(monsoon.humidity_percent, 85.0);
            assert!(monsoon.rainfall_mm > 0.0);
        }
        assert_eq!(seasonal_estimate(1).source, WeatherSource::Offline);
    }
}
