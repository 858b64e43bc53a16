//! Types, aliases and helper operations for doing math with `ultraviolet`.
use std::f64::consts::PI;
pub use ultraviolet as uv;

/// A Pose has a rotation and a translation, no scaling.
///
/// Colliders and bodies are positioned with Poses.
pub type Pose = uv::DIsometry2;
pub type Vec2 = uv::DVec2;
pub type Rotor2 = uv::DRotor2;

/// An angle in either degrees or radians.
/// Default conversion from f64 is in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}
impl From<Angle> for Rotor2 {
    #[inline]
    fn from(ang: Angle) -> Rotor2 {
        Rotor2::from_angle(ang.rad())
    }
}
impl From<Rotor2> for Angle {
    #[inline]
    fn from(rotor: Rotor2) -> Self {
        Angle::Rad(-rotor.bv.xy.atan2(rotor.s) * 2.0)
    }
}

/// A wrapper type to indicate a vector should always be normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit<T>(T);

impl Unit<Vec2> {
    pub fn new_normalize(v: Vec2) -> Self {
        Unit(v.normalized())
    }

    pub const fn new_unchecked(v: Vec2) -> Self {
        Unit(v)
    }

    /// Normalize a vector, returning `None` if it's too short to have a meaningful direction.
    #[inline]
    pub fn try_new(v: Vec2, min_mag: f64) -> Option<Self> {
        let mag = v.mag();
        if mag > min_mag && mag.is_finite() {
            Some(Unit(v / mag))
        } else {
            None
        }
    }

    pub fn unit_x() -> Self {
        Unit(Vec2::unit_x())
    }

    pub fn unit_y() -> Self {
        Unit(Vec2::unit_y())
    }

    #[inline]
    pub fn into_inner(self) -> Vec2 {
        self.0
    }
}

impl std::ops::Mul<Unit<Vec2>> for Rotor2 {
    type Output = Unit<Vec2>;

    fn mul(self, rhs: Unit<Vec2>) -> Self::Output {
        Unit(self * rhs.0)
    }
}

impl<T> std::ops::Deref for Unit<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::Neg for Unit<T>
where
    T: std::ops::Neg,
{
    type Output = Unit<<T as std::ops::Neg>::Output>;

    fn neg(self) -> Self::Output {
        Unit(-self.0)
    }
}

/// Normalize a vector, or get the zero vector if it's shorter than `min_mag`.
///
/// Bend node directions are stored this way so that "no direction" is representable
/// without an extra Option.
#[inline]
pub fn normalized_or_zero(v: Vec2, min_mag: f64) -> Vec2 {
    Unit::try_new(v, min_mag)
        .map(Unit::into_inner)
        .unwrap_or_else(Vec2::zero)
}

/// Unsigned angle between two directions. Zero if either is the zero vector.
#[inline]
pub fn angle_between(a: Vec2, b: Vec2) -> Angle {
    let mags = a.mag() * b.mag();
    if mags == 0.0 {
        return Angle::Rad(0.0);
    }
    Angle::Rad((a.dot(b) / mags).clamp(-1.0, 1.0).acos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_between_directions() {
        let right_angle = angle_between(Vec2::unit_x(), Vec2::new(0.0, 3.0));
        assert!((right_angle.deg() - 90.0).abs() < 1e-9);
        let opposite = angle_between(Vec2::new(2.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((opposite.rad() - PI).abs() < 1e-9);
        assert_eq!(angle_between(Vec2::zero(), Vec2::unit_y()).rad(), 0.0);
    }

    #[test]
    fn short_vectors_have_no_direction() {
        assert!(Unit::try_new(Vec2::new(1e-9, 0.0), 1e-6).is_none());
        assert_eq!(normalized_or_zero(Vec2::new(0.0, 1e-9), 1e-6), Vec2::zero());
        let u = Unit::try_new(Vec2::new(3.0, 4.0), 1e-6).unwrap();
        assert!((u.x - 0.6).abs() < 1e-12 && (u.y - 0.8).abs() < 1e-12);
    }
}
