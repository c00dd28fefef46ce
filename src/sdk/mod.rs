pub mod config;
pub mod facilities;
pub mod geo;
pub mod hazards;
pub mod routing;
pub mod util;
