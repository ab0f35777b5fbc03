use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

/// Draw-order entry for a layer in the embedded map document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: &'static str,
}

pub trait Layer {
    fn id(&self) -> LayerId;
    fn name(&self) -> &'static str;

    fn info(&self) -> LayerInfo {
        LayerInfo {
            id: self.id(),
            name: self.name(),
        }
    }
}
