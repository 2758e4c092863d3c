use serde::{Deserialize, Serialize};

/// Conditions of a farm used to rank crops for sowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmContext {
    pub soil_type: String,
    pub area_hectares: Option<f64>,
    /// Ambient temperature, °C
    pub temperature_c: Option<f64>,
    /// 1-12
    pub month: u32,
    pub region: Option<String>,
}

impl FarmContext {
    pub fn new(soil_type: impl Into<String>, month: u32) -> Self {
        Self {
            soil_type: soil_type.into(),
            area_hectares: None,
            temperature_c: None,
            month,
            region: None,
        }
    }

    pub fn with_area(mut self, hectares: f64) -> Self {
        self.area_hectares = Some(hectares);
        self
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature_c = Some(celsius);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}
