pub mod openweathermap;
pub mod price_service;

pub use openweathermap::OpenWeatherMapClient;
pub use price_service::PriceServiceClient;
