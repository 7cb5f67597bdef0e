use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerId(pub u64);

impl LayerId {
    pub const BOUNDARY: LayerId = LayerId(1);
    pub const BOUNDING_BOX: LayerId = LayerId(2);
}

pub trait Layer {
    fn id(&self) -> LayerId;

    /// Whether the layer reacts to pointer input.
    fn is_interactive(&self) -> bool {
        false
    }
}
