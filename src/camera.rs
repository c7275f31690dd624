//! Camera, clipping planes and frustum tests used by the sector cullers.
//!
//! All culling decisions happen on the CPU against sector bounding boxes,
//! so the only camera state carried here is the view transform and the
//! perspective parameters needed to rebuild a (possibly far-clamped)
//! projection matrix.

use glam::{DMat4, DVec3, DVec4};

use crate::scene::Aabb3;

// =============================================================================
// Plane
// =============================================================================

/// A plane in `normal . p + d = 0` form.
///
/// Also used for user clipping planes: geometry on the non-negative side of
/// every clipping plane is kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  pub normal: DVec3,
  pub d: f64,
}

impl Plane {
  /// Build from the packed `(a, b, c, d)` coefficients, normalizing so that
  /// signed distances are in world units.
  pub fn from_coefficients(v: DVec4) -> Self {
    let normal = DVec3::new(v.x, v.y, v.z);
    let len = normal.length();
    debug_assert!(len > 0.0, "degenerate plane");
    Self {
      normal: normal / len,
      d: v.w / len,
    }
  }

  /// Signed distance from the plane; positive on the normal side.
  #[inline]
  pub fn signed_distance(&self, point: DVec3) -> f64 {
    self.normal.dot(point) + self.d
  }

  /// Conservative AABB-vs-plane acceptance: true when at least one of the
  /// 8 corners lies on the non-negative side.
  ///
  /// May admit boxes that only graze the plane (false positives), never
  /// rejects a box with any accepted geometry.
  pub fn accepts_corners(&self, corners: &[DVec3; 8]) -> bool {
    corners.iter().any(|&c| self.signed_distance(c) >= 0.0)
  }
}

// =============================================================================
// Camera
// =============================================================================

/// Perspective projection parameters (0..1 depth range).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveProjection {
  /// Vertical field of view in radians.
  pub fov_y: f64,
  /// Width / height.
  pub aspect: f64,
  pub near: f64,
  pub far: f64,
}

impl PerspectiveProjection {
  pub fn matrix(&self) -> DMat4 {
    DMat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
  }
}

impl Default for PerspectiveProjection {
  fn default() -> Self {
    Self {
      fov_y: std::f64::consts::FRAC_PI_3,
      aspect: 16.0 / 9.0,
      near: 0.1,
      far: 10_000.0,
    }
  }
}

/// Camera state consumed by the cullers.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
  /// Camera position in world space.
  pub position: DVec3,
  /// World-to-view transform.
  pub view: DMat4,
  pub projection: PerspectiveProjection,
}

impl Camera {
  /// Build a camera looking from `position` towards `target`.
  pub fn look_at(position: DVec3, target: DVec3, up: DVec3, projection: PerspectiveProjection) -> Self {
    Self {
      position,
      view: DMat4::look_at_rh(position, target, up),
      projection,
    }
  }

  /// Combined world-to-clip transform.
  pub fn view_projection(&self) -> DMat4 {
    self.projection.matrix() * self.view
  }

  /// A copy of this camera with the far plane clamped to `max_far`.
  ///
  /// Used to build the short-range frustum that force-loads sectors near
  /// the camera.
  pub fn with_far_clamped(&self, max_far: f64) -> Self {
    let mut clamped = *self;
    clamped.projection.far = clamped.projection.far.min(max_far);
    clamped
  }
}

// =============================================================================
// Frustum
// =============================================================================

/// View frustum as 6 inward-facing planes.
///
/// Extract from any world-to-clip (or model-to-clip) matrix, so sector
/// bounds can be tested in model space by folding the model matrix into
/// the extraction matrix.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
  planes: [Plane; 6],
}

impl Frustum {
  /// Gribb–Hartmann plane extraction for a 0..1 depth-range projection.
  pub fn from_matrix(matrix: &DMat4) -> Self {
    let r0 = matrix.row(0);
    let r1 = matrix.row(1);
    let r2 = matrix.row(2);
    let r3 = matrix.row(3);
    Self {
      planes: [
        Plane::from_coefficients(r3 + r0), // left
        Plane::from_coefficients(r3 - r0), // right
        Plane::from_coefficients(r3 + r1), // bottom
        Plane::from_coefficients(r3 - r1), // top
        Plane::from_coefficients(r2),      // near (z >= 0 in clip space)
        Plane::from_coefficients(r3 - r2), // far
      ],
    }
  }

  /// Conservative AABB intersection (p-vertex test).
  ///
  /// A box is rejected only when it lies fully outside one plane, so boxes
  /// near frustum edges may be accepted spuriously. False negatives never
  /// occur, which is the property the cullers rely on.
  pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
    for plane in &self.planes {
      // Corner of the box farthest along the plane normal
      let p = DVec3::new(
        if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
        if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
        if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
      );
      if plane.signed_distance(p) < 0.0 {
        return false;
      }
    }
    true
  }
}

// =============================================================================
// Screen-space projection heuristic
// =============================================================================

/// Fraction of the screen covered by the NDC bounding rectangle of an
/// AABB's projected corners, in `[0, 1]`.
///
/// Boxes straddling the camera plane count as full-screen; boxes entirely
/// behind the camera count as zero. This is a size heuristic for priority
/// ordering, not an exact coverage measure.
pub fn projected_screen_area(matrix: &DMat4, aabb: &Aabb3) -> f64 {
  let mut min_x = f64::INFINITY;
  let mut min_y = f64::INFINITY;
  let mut max_x = f64::NEG_INFINITY;
  let mut max_y = f64::NEG_INFINITY;
  let mut in_front = 0;
  let mut behind = 0;

  for corner in aabb.corners() {
    let clip = *matrix * corner.extend(1.0);
    if clip.w <= f64::EPSILON {
      behind += 1;
      continue;
    }
    in_front += 1;
    let x = (clip.x / clip.w).clamp(-1.0, 1.0);
    let y = (clip.y / clip.w).clamp(-1.0, 1.0);
    min_x = min_x.min(x);
    min_y = min_y.min(y);
    max_x = max_x.max(x);
    max_y = max_y.max(y);
  }

  if in_front == 0 {
    return 0.0;
  }
  if behind > 0 {
    // Straddles the camera plane; the clamped rect is meaningless
    return 1.0;
  }

  // NDC spans [-1, 1] on both axes, total area 4
  ((max_x - min_x) * (max_y - min_y) / 4.0).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;
