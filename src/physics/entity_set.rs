use super::{Body, Collider};

use thunderdome as td;

/// Key type to look up a collider stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderKey(pub(super) td::Index);

impl ColliderKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from colliders to other things.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Key type to look up a body stored in the physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(pub(super) td::Index);

impl BodyKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// The objects in the physics world: moving bodies and static obstacle colliders.
///
/// Obstacles are not attached to bodies; to move one, edit its pose directly.
#[derive(Default)]
pub struct EntitySet {
    pub(super) bodies: td::Arena<Body>,
    pub(super) colliders: td::Arena<Collider>,
}

impl EntitySet {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Access a [`Body`][super::Body] in the physics world, if it still exists.
    #[inline]
    pub fn get_body(&self, body: BodyKey) -> Option<&Body> {
        self.bodies.get(body.0)
    }

    /// Mutably access a [`Body`][super::Body] in the physics world, if it still exists.
    #[inline]
    pub fn get_body_mut(&mut self, body: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(body.0)
    }

    /// Access a [`Collider`][super::Collider] in the physics world, if it still exists.
    #[inline]
    pub fn get_collider(&self, coll: ColliderKey) -> Option<&Collider> {
        self.colliders.get(coll.0)
    }

    /// Mutably access a [`Collider`][super::Collider] in the physics world, if it still exists.
    #[inline]
    pub fn get_collider_mut(&mut self, coll: ColliderKey) -> Option<&mut Collider> {
        self.colliders.get_mut(coll.0)
    }

    /// Insert a body into the world.
    #[inline]
    pub fn insert_body(&mut self, body: Body) -> BodyKey {
        BodyKey(self.bodies.insert(body))
    }

    /// Insert an obstacle collider into the world.
    #[inline]
    pub fn insert_collider(&mut self, coll: Collider) -> ColliderKey {
        ColliderKey(self.colliders.insert(coll))
    }

    /// Remove a [`Body`][super::Body] from the physics world,
    /// returning it if it still existed.
    #[inline]
    pub fn remove_body(&mut self, body: BodyKey) -> Option<Body> {
        self.bodies.remove(body.0)
    }

    /// Remove a [`Collider`][super::Collider] from the physics world,
    /// returning it if it still existed.
    #[inline]
    pub fn remove_collider(&mut self, coll: ColliderKey) -> Option<Collider> {
        self.colliders.remove(coll.0)
    }

    /// Iterate over every collider in the world.
    #[inline]
    pub fn colliders(&self) -> impl '_ + Iterator<Item = (ColliderKey, &Collider)> {
        self.colliders.iter().map(|(k, c)| (ColliderKey(k), c))
    }

    /// Iterate over every body in the world.
    #[inline]
    pub fn bodies(&self) -> impl '_ + Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter().map(|(k, b)| (BodyKey(k), b))
    }

    pub(super) fn clear(&mut self) {
        self.bodies.clear();
        self.colliders.clear();
    }
}
