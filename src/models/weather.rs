use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which fallback tier produced a weather reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    Live,
    Cached,
    Offline,
}

impl WeatherSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherSource::Live => "live",
            WeatherSource::Cached => "cached",
            WeatherSource::Offline => "offline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "live" => Some(WeatherSource::Live),
            "cached" => Some(WeatherSource::Cached),
            "offline" => Some(WeatherSource::Offline),
            _ => None,
        }
    }
}

impl std::fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions shared by every crop in one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub rainfall_mm: f64,
    pub icon: String,
    pub source: WeatherSource,
    pub timestamp: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;
    pub const DEFAULT_HUMIDITY_PERCENT: f64 = 50.0;
    pub const DEFAULT_RAINFALL_MM: f64 = 0.0;

    pub fn new(temperature_c: f64, humidity_percent: f64, rainfall_mm: f64) -> Self {
        Self {
            temperature_c,
            humidity_percent,
            rainfall_mm,
            icon: String::new(),
            source: WeatherSource::Live,
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: WeatherSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

/// Conditions assumed when no weather reading is available at all.
impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_TEMPERATURE_C,
            Self::DEFAULT_HUMIDITY_PERCENT,
            Self::DEFAULT_RAINFALL_MM,
        )
        .with_source(WeatherSource::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_values() {
        let w = WeatherSnapshot::default();
        assert_eq!(w.temperature_c, 25.0);
        assert_eq!(w.humidity_percent, 50.0);
        assert_eq!(w.rainfall_mm, 0.0);
        assert_eq!(w.source, WeatherSource::Offline);
    }

    #[test]
    fn weather_source_display() {
        assert_eq!(WeatherSource::Live.as_str(), "live");
        assert_eq!(WeatherSource::from_str("CACHED"), Some(WeatherSource::Cached));
        assert_eq!(WeatherSource::from_str("satellite"), None);
    }
}
