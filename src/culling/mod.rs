//! Sector culling strategies.
//!
//! A culler is a pure, synchronous decision step: given the camera, the
//! registered models and a budget, it decides which sector of which model
//! to take at which level of detail, producing the wanted-sector list and
//! the spend accounting for one pass. Two strategies exist:
//!
//! - [`ByScreenSizeSectorCuller`]: CPU-only heuristic ordering sectors by
//!   projected screen size, budgeted by render cost.
//! - [`ByVisibilityGpuSectorCuller`]: ordering delegated to a GPU coverage
//!   rasterizer collaborator, budgeted by download size and draw calls,
//!   with forced near-camera sectors and clipping-plane support.
//!
//! Strategy selection happens at construction; both sit behind the
//! [`SectorCuller`] trait.

pub mod gpu_visibility;
pub mod screen_size;

pub use gpu_visibility::{ByVisibilityGpuSectorCuller, OrderSectorsByVisibilityCoverage, PrioritizedSector};
pub use screen_size::ByScreenSizeSectorCuller;

pub use crate::taken::{default_sector_cost, DetermineSectorCost};

use crate::camera::{Camera, Plane};
use crate::types::{
  CadLoadingHints, CadModelMetadata, CadModelSectorBudget, PrioritizedArea,
  PrioritizedWantedSector, SectorLoadingSpent,
};

/// Everything a culling pass looks at.
#[derive(Clone)]
pub struct DetermineSectorsInput {
  pub camera: Camera,
  /// Active user clipping planes in world space (empty = none).
  pub clipping_planes: Vec<Plane>,
  /// The registered models.
  pub cad_models_metadata: Vec<CadModelMetadata>,
  pub loading_hints: CadLoadingHints,
  /// True while the camera animates; loading pauses to avoid wasted
  /// fetches for sectors superseded within milliseconds.
  pub camera_in_motion: bool,
  pub budget: CadModelSectorBudget,
  /// Regions the caller wants loaded at elevated priority.
  pub prioritized_areas: Vec<PrioritizedArea>,
}

/// Result of one culling pass.
#[derive(Clone, Debug)]
pub struct DeterminedSectors {
  /// One entry per sector per model with its final level of detail,
  /// sorted descending by priority.
  pub wanted_sectors: Vec<PrioritizedWantedSector>,
  pub spent_budget: SectorLoadingSpent,
}

/// Strategy interface for the culling decision.
pub trait SectorCuller {
  /// Decide which sectors to take for this pass. Pure and synchronous;
  /// must complete before any fetch of the same pass is issued.
  fn determine_sectors(&mut self, input: &DetermineSectorsInput) -> DeterminedSectors;

  /// Optional second-pass filter removing candidates occluded by already
  /// loaded geometry. The default keeps everything.
  fn filter_sectors_to_load(
    &mut self,
    _input: &DetermineSectorsInput,
    candidates: Vec<PrioritizedWantedSector>,
  ) -> Vec<PrioritizedWantedSector> {
    candidates
  }
}
