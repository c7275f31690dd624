//! Axis-aligned bounding box in model space, double precision.
//!
//! Plant-scale CAD models routinely span kilometers with millimeter detail,
//! so sector bounds are kept in f64 end to end.

use glam::{DMat4, DVec3};

/// Double-precision axis-aligned bounding box.
///
/// Sector bounds live in model space; apply the model matrix (via
/// [`Aabb3::corners`] + transform) before testing against world-space planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
  /// Minimum corner (inclusive).
  pub min: DVec3,
  /// Maximum corner (inclusive).
  pub max: DVec3,
}

impl Aabb3 {
  /// Create a new AABB from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: DVec3, max: DVec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Create a new AABB from center and half-extents.
  pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
    Self {
      min: center - half_extents,
      max: center + half_extents,
    }
  }

  /// Check if this AABB overlaps with another (shared boundary counts).
  #[inline]
  pub fn overlaps(&self, other: &Aabb3) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
      && self.min.z <= other.max.z
      && self.max.z >= other.min.z
  }

  /// Check if this AABB contains a point.
  #[inline]
  pub fn contains_point(&self, point: DVec3) -> bool {
    point.x >= self.min.x
      && point.x <= self.max.x
      && point.y >= self.min.y
      && point.y <= self.max.y
      && point.z >= self.min.z
      && point.z <= self.max.z
  }

  /// Get the center of the AABB.
  #[inline]
  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * 0.5
  }

  /// Get the size of the AABB (max - min).
  #[inline]
  pub fn size(&self) -> DVec3 {
    self.max - self.min
  }

  /// The 8 corners, octant-ordered (bit 0 = +X, bit 1 = +Y, bit 2 = +Z).
  pub fn corners(&self) -> [DVec3; 8] {
    let (lo, hi) = (self.min, self.max);
    [
      DVec3::new(lo.x, lo.y, lo.z),
      DVec3::new(hi.x, lo.y, lo.z),
      DVec3::new(lo.x, hi.y, lo.z),
      DVec3::new(hi.x, hi.y, lo.z),
      DVec3::new(lo.x, lo.y, hi.z),
      DVec3::new(hi.x, lo.y, hi.z),
      DVec3::new(lo.x, hi.y, hi.z),
      DVec3::new(hi.x, hi.y, hi.z),
    ]
  }

  /// Distance from a point to the closest point on the box (0 inside).
  #[inline]
  pub fn distance_to_point(&self, point: DVec3) -> f64 {
    let clamped = point.clamp(self.min, self.max);
    point.distance(clamped)
  }

  /// Smallest AABB containing both boxes.
  pub fn union(&self, other: &Aabb3) -> Aabb3 {
    Aabb3 {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// Axis-aligned bounds of this box under an affine transform.
  ///
  /// Conservative: the result bounds the transformed corners, which may be
  /// larger than the tightest rotated fit.
  pub fn transformed(&self, matrix: &DMat4) -> Aabb3 {
    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for corner in self.corners() {
      let p = matrix.transform_point3(corner);
      min = min.min(p);
      max = max.max(p);
    }
    Aabb3 { min, max }
  }
}
