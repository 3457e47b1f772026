//! Typed per-agent extension state.
//!
//! Mutators attach auxiliary state to an agent without the [`Agent`] type
//! knowing about them. Each slot is keyed by the Rust type stored in it, so
//! two extensions cannot collide as long as they use distinct state types.
//!
//! [`Agent`]: crate::agent::Agent

use std::any::{Any, TypeId};
use std::collections::BTreeMap;

/// A keyed store of opaque extension values.
#[derive(Default)]
pub struct ExtensionBag {
    slots: BTreeMap<TypeId, Box<dyn Any + Send>>,
}

impl ExtensionBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the value of type `T`, if present.
    pub fn get<T: Any + Send>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<T>())
    }

    /// Mutably borrow the value of type `T`, if present.
    pub fn get_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.slots
            .get_mut(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_mut::<T>())
    }

    /// Apply `f` to the value of type `T`, inserting `T::default()` first
    /// if absent.
    pub fn update<T: Any + Send + Default>(&mut self, f: impl FnOnce(&mut T)) {
        match self.get_mut::<T>() {
            Some(value) => f(value),
            None => {
                let mut value = T::default();
                f(&mut value);
                self.insert(value);
            }
        }
    }

    /// Store a value, returning the previous one of the same type.
    pub fn insert<T: Any + Send>(&mut self, value: T) -> Option<T> {
        self.slots
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Remove and return the value of type `T`.
    pub fn remove<T: Any + Send>(&mut self) -> Option<T> {
        self.slots
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Whether a value of type `T` is present.
    pub fn contains<T: Any + Send>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no extension state is attached.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl core::fmt::Debug for ExtensionBag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExtensionBag")
            .field("slots", &self.slots.len())
            .finish()
    }
}
