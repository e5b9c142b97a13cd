pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod message;
pub mod model;

pub use bootstrap::initialize;
pub use config::Config;
