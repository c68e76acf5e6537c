pub mod bracket;
pub mod config;
pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod progress;

pub use bracket::*;
pub use config::*;
pub use context::*;
pub use executor::*;
pub use orchestrator::*;
pub use progress::*;
