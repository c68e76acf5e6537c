//! On-disk test reports: header record, entry formatting, directory layout,
//! rotation of previous reports, and the writer that ties them together.

pub mod entry;
pub mod error;
pub mod header;
pub mod layout;
pub mod registry;
pub mod rotate;
pub mod stamp;
pub mod writer;

pub use entry::*;
pub use error::*;
pub use header::*;
pub use layout::*;
pub use registry::*;
pub use rotate::*;
pub use stamp::*;
pub use writer::*;
