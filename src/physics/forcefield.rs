use crate::math as m;

/// A (possibly) position-dependent acceleration that is
/// applied to all bodies with finite mass each physics step.
pub trait ForceField {
    fn value_at(&self, position: m::Vec2) -> m::Vec2;
}

pub struct NoneField;
impl ForceField for NoneField {
    fn value_at(&self, _: m::Vec2) -> m::Vec2 {
        m::Vec2::zero()
    }
}

/// Constant gravity field over all of space.
pub struct Gravity(pub m::Vec2);
impl ForceField for Gravity {
    fn value_at(&self, _pos: m::Vec2) -> m::Vec2 {
        self.0
    }
}
