//! # Component Storage
//!
//! Dense, slot-indexed storage. Every slot exists for the lifetime of the
//! world; despawning an entity resets its slot instead of freeing it.

use super::component::Component;

/// Pre-allocated storage for a single component type.
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Position> = ComponentStorage::new(64);
/// storage.set(3, Position(Vec3::new(1.0, 2.0, 3.0)));
/// ```
pub struct ComponentStorage<C: Component> {
    data: Box<[C]>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates storage with `capacity` default-initialised slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "{} storage needs a non-zero capacity", C::NAME);
        Self {
            data: vec![C::default(); capacity].into_boxed_slice(),
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Component at `index`, or `None` when out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Mutable component at `index`, or `None` when out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    /// Overwrites the slot at `index`.
    ///
    /// Returns `false` if `index` is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> bool {
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = component;
                true
            }
            None => false,
        }
    }

    /// Resets the slot at `index` to the default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }
}
