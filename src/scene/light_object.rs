use super::light::{LightKind, LightMut, LightRef};
use super::registry::{LightHandle, LightRegistry};

/// Named scene entry for a light stored in the [`LightRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub struct LightObject {
    pub name: String,
    handle: LightHandle,
}

impl LightObject {
    pub fn new(name: impl Into<String>, handle: LightHandle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    pub fn handle(&self) -> LightHandle {
        self.handle
    }

    pub fn kind(&self) -> LightKind {
        self.handle.kind()
    }

    /// Index into the shader-side array for this light's kind.
    pub fn array_index(&self, registry: &LightRegistry) -> Option<usize> {
        registry.index_of(self.handle)
    }

    pub fn light<'r>(&self, registry: &'r LightRegistry) -> Option<LightRef<'r>> {
        registry.get(self.handle)
    }

    pub fn light_mut<'r>(&self, registry: &'r mut LightRegistry) -> Option<LightMut<'r>> {
        registry.get_mut(self.handle)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.kind().tag(), self.name)
    }
}
