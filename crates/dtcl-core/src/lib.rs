pub mod codes;
pub mod engine;
pub mod gate;
pub mod ids;
pub mod model;
pub mod outcomes;
pub mod types;

pub use codes::*;
pub use engine::*;
pub use gate::*;
pub use ids::*;
pub use model::*;
pub use outcomes::*;
pub use types::*;
