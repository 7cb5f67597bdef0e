//! Step submission: per-step forms, their multipart encoding, and the
//! transport seam towards the setup API.

pub mod api;
pub mod form;
pub mod gate;
pub mod steps;

pub use api::*;
pub use form::*;
pub use gate::*;
pub use steps::*;
