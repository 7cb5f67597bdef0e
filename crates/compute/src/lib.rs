//! Geometry analysis over parsed boundary documents.

pub mod analysis;

pub use analysis::*;
pub use foundation::repair_box;
