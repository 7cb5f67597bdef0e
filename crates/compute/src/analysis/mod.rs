pub mod properties;
pub mod spatial;

pub use properties::*;
pub use spatial::*;
