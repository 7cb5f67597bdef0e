//! Map-side models for the step-2 bounding box: the editor, its overlay and
//! corner handles. Nothing here touches a renderer.

pub mod bbox;
pub mod handles;
pub mod layer;
pub mod overlay;
pub mod symbology;

pub use bbox::*;
pub use handles::*;
pub use layer::*;
pub use overlay::*;
pub use symbology::*;
