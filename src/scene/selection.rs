/// What the user currently has selected. Holding one kind excludes the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Object(usize),
    Light(usize),
}

impl Selection {
    pub fn object(self) -> Option<usize> {
        match self {
            Self::Object(index) => Some(index),
            _ => None,
        }
    }

    pub fn light(self) -> Option<usize> {
        match self {
            Self::Light(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }

    /// Drops the selection if it points past the end of its collection.
    pub fn validated(self, object_count: usize, light_count: usize) -> Self {
        match self {
            Self::Object(index) if index < object_count => self,
            Self::Light(index) if index < light_count => self,
            _ => Self::None,
        }
    }

    /// Adjusts for removal of `removed` from the object list.
    pub fn after_object_removed(self, removed: usize) -> Self {
        match self {
            Self::Object(index) if index == removed => Self::None,
            Self::Object(index) if index > removed => Self::Object(index - 1),
            other => other,
        }
    }

    pub fn after_light_removed(self, removed: usize) -> Self {
        match self {
            Self::Light(index) if index == removed => Self::None,
            Self::Light(index) if index > removed => Self::Light(index - 1),
            other => other,
        }
    }
}
