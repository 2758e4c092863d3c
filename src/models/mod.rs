pub mod advisory;
pub mod crop;
pub mod farm;
pub mod prediction;
pub mod risk;
pub mod weather;

pub use advisory::*;
pub use crop::*;
pub use farm::*;
pub use prediction::*;
pub use risk::*;
pub use weather::*;
