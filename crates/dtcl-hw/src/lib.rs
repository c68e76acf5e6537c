//! Seam to the external hardware-communication library.
//!
//! The device protocol itself lives outside this workspace; everything here is
//! the interface the harness needs from it plus a scriptable stand-in.

pub mod detect;
pub mod events;
pub mod sim;
pub mod traits;

pub use detect::*;
pub use events::*;
pub use sim::*;
pub use traits::*;
