#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod policy;
pub mod progress;
pub mod recommend;
pub mod settings;
pub mod time;

pub use error::Error;
pub use settings::EngineSettings;
pub use time::Clock;
