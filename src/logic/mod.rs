pub mod advisory;
pub mod calculations;
pub mod harvest;
pub mod history;
pub mod market;
pub mod orchestrator;
pub mod prediction;
pub mod spoilage;
pub mod suitability;
pub mod weather;

pub use market::MarketPriceService;
pub use orchestrator::{AdvisoryOrchestrator, AdvisoryStores, BatchReport};
pub use prediction::PredictionClient;
pub use weather::WeatherProvider;
