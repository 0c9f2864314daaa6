//! Light storage shared by the scene manager and the render passes.
//!
//! Point and spot lights live in slot maps so a [`LightHandle`] never aliases
//! another light. Array order (what the shaders see as `pointLights[i]`) is a
//! separate key vector; removing from it shifts later lights down one index,
//! and every surviving handle resolves to its new index on the next lookup.

use super::light::{DirectionalLight, LightKind, LightMut, LightRef, PointLight, SpotLight};
use crate::render::backend::ShadowBackend;
use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    pub struct PointKey;
    pub struct SpotKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightHandle {
    Directional,
    Point(PointKey),
    Spot(SpotKey),
}

impl LightHandle {
    pub fn kind(self) -> LightKind {
        match self {
            Self::Directional => LightKind::Directional,
            Self::Point(_) => LightKind::Point,
            Self::Spot(_) => LightKind::Spot,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind:?} light capacity of {capacity} reached")]
    CapacityExceeded { kind: LightKind, capacity: usize },
    #[error("the directional light cannot be removed")]
    DirectionalNotRemovable,
    #[error("light handle no longer refers to a live light")]
    StaleHandle,
}

struct LightArray<K: Key, T> {
    slots: SlotMap<K, T>,
    order: Vec<K>,
    capacity: usize,
}

impl<K: Key, T> LightArray<K, T> {
    fn new(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, light: T) -> Option<K> {
        if self.order.len() >= self.capacity {
            return None;
        }
        let key = self.slots.insert(light);
        self.order.push(key);
        Some(key)
    }

    fn remove(&mut self, key: K) -> Option<(usize, T)> {
        let index = self.index_of(key)?;
        self.order.remove(index);
        let light = self.slots.remove(key)?;
        Some((index, light))
    }

    fn index_of(&self, key: K) -> Option<usize> {
        self.order.iter().position(|&candidate| candidate == key)
    }

    fn get(&self, key: K) -> Option<&T> {
        self.slots.get(key)
    }

    fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots.get_mut(key)
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|&key| self.slots.get(key))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.values_mut()
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }
}

pub struct LightRegistry {
    directional: DirectionalLight,
    points: LightArray<PointKey, PointLight>,
    spots: LightArray<SpotKey, SpotLight>,
}

impl LightRegistry {
    pub fn new(directional: DirectionalLight, max_point_lights: usize, max_spot_lights: usize) -> Self {
        Self {
            directional,
            points: LightArray::new(max_point_lights),
            spots: LightArray::new(max_spot_lights),
        }
    }

    pub fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    pub fn directional_mut(&mut self) -> &mut DirectionalLight {
        &mut self.directional
    }

    pub fn add_point(&mut self, light: PointLight) -> Result<LightHandle, RegistryError> {
        let key = self.points.push(light).ok_or(RegistryError::CapacityExceeded {
            kind: LightKind::Point,
            capacity: self.points.capacity,
        })?;
        log::info!("Added point light {} of {}", self.points.len(), self.points.capacity);
        Ok(LightHandle::Point(key))
    }

    pub fn add_spot(&mut self, light: SpotLight) -> Result<LightHandle, RegistryError> {
        let key = self.spots.push(light).ok_or(RegistryError::CapacityExceeded {
            kind: LightKind::Spot,
            capacity: self.spots.capacity,
        })?;
        log::info!("Added spot light {} of {}", self.spots.len(), self.spots.capacity);
        Ok(LightHandle::Spot(key))
    }

    /// Removes a point or spot light; returns the array index it occupied.
    pub fn remove(&mut self, handle: LightHandle) -> Result<usize, RegistryError> {
        let index = match handle {
            LightHandle::Directional => return Err(RegistryError::DirectionalNotRemovable),
            LightHandle::Point(key) => self.points.remove(key).map(|(index, _)| index),
            LightHandle::Spot(key) => self.spots.remove(key).map(|(index, _)| index),
        }
        .ok_or(RegistryError::StaleHandle)?;
        log::info!("Removed {:?} light at index {index}", handle.kind());
        Ok(index)
    }

    pub fn get(&self, handle: LightHandle) -> Option<LightRef<'_>> {
        match handle {
            LightHandle::Directional => Some(LightRef::Directional(&self.directional)),
            LightHandle::Point(key) => self.points.get(key).map(LightRef::Point),
            LightHandle::Spot(key) => self.spots.get(key).map(LightRef::Spot),
        }
    }

    pub fn get_mut(&mut self, handle: LightHandle) -> Option<LightMut<'_>> {
        match handle {
            LightHandle::Directional => Some(LightMut::Directional(&mut self.directional)),
            LightHandle::Point(key) => self.points.get_mut(key).map(LightMut::Point),
            LightHandle::Spot(key) => self.spots.get_mut(key).map(LightMut::Spot),
        }
    }

    pub fn contains(&self, handle: LightHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Current array index; the directional light is always 0.
    pub fn index_of(&self, handle: LightHandle) -> Option<usize> {
        match handle {
            LightHandle::Directional => Some(0),
            LightHandle::Point(key) => self.points.index_of(key),
            LightHandle::Spot(key) => self.spots.index_of(key),
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn spot_count(&self) -> usize {
        self.spots.len()
    }

    pub fn point_capacity(&self) -> usize {
        self.points.capacity
    }

    pub fn spot_capacity(&self) -> usize {
        self.spots.capacity
    }

    pub fn points(&self) -> impl Iterator<Item = &PointLight> {
        self.points.iter()
    }

    pub fn spots(&self) -> impl Iterator<Item = &SpotLight> {
        self.spots.iter()
    }

    /// Drops every point and spot light; the directional light stays.
    pub fn clear_dynamic(&mut self) {
        self.points.clear();
        self.spots.clear();
    }

    /// Creates missing shadow maps. A light whose map fails keeps rendering unshadowed.
    pub fn init_shadow_maps(&mut self, backend: &mut dyn ShadowBackend) {
        let shadows = std::iter::once(&mut self.directional.base.shadow)
            .chain(self.points.iter_mut().map(|light| &mut light.base.shadow))
            .chain(self.spots.iter_mut().map(|light| &mut light.point.base.shadow));
        for shadow in shadows {
            if let Err(err) = shadow.init(backend) {
                log::warn!("{err}; light will render without shadows");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LightHandle, LightRegistry, RegistryError};
    use crate::render::backend::ShadowKind;
    use crate::scene::light::{
        Attenuation, DirectionalLight, LightBase, LightKind, PointLight, ShadowMap, SpotLight,
    };
    use glam::Vec3;

    fn registry(capacity: usize) -> LightRegistry {
        let base = LightBase::new(Vec3::ONE, 0.6, 0.7, ShadowMap::new(ShadowKind::Directional, 2048, 2048));
        LightRegistry::new(DirectionalLight::new(base, Vec3::NEG_Y), capacity, capacity)
    }

    fn point(x: f32) -> PointLight {
        let base = LightBase::new(Vec3::ONE, 0.1, 1.0, ShadowMap::new(ShadowKind::Omni, 1024, 1024));
        PointLight::new(base, Vec3::new(x, 0.0, 0.0), Attenuation::default(), 0.01, 100.0)
    }

    #[test]
    fn removing_first_point_shifts_survivor_down() {
        let mut lights = registry(3);
        let first = lights.add_point(point(0.0)).expect("first");
        let second = lights.add_point(point(1.0)).expect("second");
        assert_eq!(lights.index_of(second), Some(1));

        assert_eq!(lights.remove(first), Ok(0));
        assert_eq!(lights.index_of(second), Some(0));
        assert_eq!(lights.index_of(first), None);
        assert_eq!(lights.point_count(), 1);
        assert_eq!(lights.get(second).and_then(|light| light.position()), Some(Vec3::X));
    }

    #[test]
    fn removal_only_shifts_later_indices() {
        let mut lights = registry(4);
        let handles: Vec<LightHandle> = (0..4)
            .map(|i| lights.add_point(point(i as f32)).expect("add"))
            .collect();
        lights.remove(handles[1]).expect("remove");

        assert_eq!(lights.index_of(handles[0]), Some(0));
        assert_eq!(lights.index_of(handles[2]), Some(1));
        assert_eq!(lights.index_of(handles[3]), Some(2));
        let xs: Vec<f32> = lights.points().map(|light| light.position.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn capacity_overflow_is_rejected_without_side_effects() {
        let mut lights = registry(1);
        lights.add_point(point(0.0)).expect("first");
        assert_eq!(
            lights.add_point(point(1.0)),
            Err(RegistryError::CapacityExceeded {
                kind: LightKind::Point,
                capacity: 1
            })
        );
        assert_eq!(lights.point_count(), 1);
    }

    #[test]
    fn directional_is_singular_and_permanent() {
        let mut lights = registry(1);
        assert_eq!(
            lights.remove(LightHandle::Directional),
            Err(RegistryError::DirectionalNotRemovable)
        );
        assert!(lights.contains(LightHandle::Directional));
    }

    #[test]
    fn stale_handle_is_reported() {
        let mut lights = registry(2);
        let spot = lights
            .add_spot(SpotLight::new(point(0.0), Vec3::NEG_Y, 20.0))
            .expect("spot");
        lights.remove(spot).expect("remove");
        assert_eq!(lights.remove(spot), Err(RegistryError::StaleHandle));
        assert!(lights.get(spot).is_none());
    }

    #[test]
    fn reused_slot_does_not_revive_old_handle() {
        let mut lights = registry(1);
        let old = lights.add_point(point(0.0)).expect("old");
        lights.remove(old).expect("remove");
        let new = lights.add_point(point(5.0)).expect("new");
        assert_ne!(old, new);
        assert!(lights.get(old).is_none());
        assert_eq!(lights.index_of(new), Some(0));
    }

    #[test]
    fn clear_dynamic_keeps_the_directional_light() {
        let mut lights = registry(2);
        let handle = lights.add_point(point(0.0)).expect("point");
        lights
            .add_spot(SpotLight::new(point(1.0), Vec3::NEG_Y, 20.0))
            .expect("spot");
        lights.directional_mut().direction = Vec3::NEG_Z;

        lights.clear_dynamic();
        assert_eq!((lights.point_count(), lights.spot_count()), (0, 0));
        assert!(lights.get(handle).is_none());
        assert_eq!(lights.directional().direction, Vec3::NEG_Z);
        assert_eq!(lights.point_capacity(), 2);
    }
}
