//! Core value types for sector streaming: levels of detail, costs,
//! budgets, spend accounting and the wanted/consumed sector descriptors
//! that flow through the pipeline.

use std::ops::{Add, AddAssign};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::DMat4;

use crate::scene::{Aabb3, SectorId, SectorMetadata, SectorScene};

// =============================================================================
// ModelIdentifier
// =============================================================================

/// Atomic counter for generating unique model identifiers.
static MODEL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque model identifier.
///
/// Generated atomically - guaranteed unique within process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ModelIdentifier(u64);

impl ModelIdentifier {
  /// Generate a new unique identifier.
  pub fn new() -> Self {
    Self(MODEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  /// Get the raw ID value.
  pub fn raw(&self) -> u64 {
    self.0
  }
}

impl Default for ModelIdentifier {
  fn default() -> Self {
    Self::new()
  }
}

// =============================================================================
// LevelOfDetail
// =============================================================================

/// Per-sector materialization state.
///
/// `Simple` and `Detailed` are alternative representations, not points on a
/// total order; `Discarded` means "not loaded".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LevelOfDetail {
  /// Not loaded.
  #[default]
  Discarded,
  /// Low-detail quad representation (faces file).
  Simple,
  /// Full geometry (index file).
  Detailed,
}

// =============================================================================
// Costs and budget
// =============================================================================

/// Resource cost of loading one sector at one level of detail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectorCost {
  /// Download size in bytes.
  pub download_size: u64,
  /// Draw calls the loaded representation will issue.
  pub draw_calls: u32,
}

impl SectorCost {
  pub const ZERO: Self = Self {
    download_size: 0,
    draw_calls: 0,
  };
}

impl Add for SectorCost {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Self {
      download_size: self.download_size + rhs.download_size,
      draw_calls: self.draw_calls + rhs.draw_calls,
    }
  }
}

impl AddAssign for SectorCost {
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

/// Caller-configurable resource ceiling for one culling pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CadModelSectorBudget {
  /// Ceiling on total bytes downloaded for loaded geometry.
  pub geometry_download_size_bytes: u64,
  /// Ceiling on total draw calls of loaded geometry.
  pub maximum_number_of_draw_calls: u32,
  /// Ceiling on accumulated estimated render cost (screen-size culler).
  pub maximum_render_cost: f32,
  /// Sectors within this camera distance are always loaded detailed.
  pub high_detail_proximity_threshold: f64,
}

impl CadModelSectorBudget {
  /// Default budget tuned for mid-range hardware.
  pub const DEFAULT: Self = Self {
    geometry_download_size_bytes: 35 * 1024 * 1024,
    maximum_number_of_draw_calls: 2000,
    maximum_render_cost: 15_000_000.0,
    high_detail_proximity_threshold: 10.0,
  };
}

impl Default for CadModelSectorBudget {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Accounting snapshot of what a culling pass decided to spend.
///
/// Recomputed per pass from the taken-sector bookkeeping, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SectorLoadingSpent {
  /// Total download size of all taken sectors, in bytes.
  pub download_size: u64,
  /// Total draw calls of all taken sectors.
  pub draw_calls: u32,
  /// Total estimated render cost of detailed sectors.
  pub render_cost: f64,
  /// Sectors taken at any loaded level of detail (simple + detailed).
  pub loaded_sector_count: usize,
  /// Sectors taken at the simple level of detail.
  pub simple_sector_count: usize,
  /// Sectors taken at the detailed level of detail.
  pub detailed_sector_count: usize,
  /// Detailed sectors forced in regardless of budget (priority infinity).
  pub forced_detailed_sector_count: usize,
  /// All sectors considered, including discarded ones.
  pub total_sector_count: usize,
  /// Sum of finite positive priorities over taken sectors.
  pub accumulated_priority: f64,
}

// =============================================================================
// Hints and progress
// =============================================================================

/// Caller-provided loading hints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CadLoadingHints {
  /// When set, no new loader passes are started.
  pub suspend_loading: bool,
}

/// Progress snapshot of the current (or last) loader pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadingState {
  /// Sectors requested from the repository this pass.
  pub items_requested: u32,
  /// Sectors settled (loaded or discarded) so far.
  pub items_loaded: u32,
  /// Sectors removed by occlusion filtering this pass.
  pub items_culled: u32,
  /// True while a pass has unsettled sectors.
  pub is_loading: bool,
}

// =============================================================================
// Model registration
// =============================================================================

/// Everything the cullers need to know about one registered model.
#[derive(Clone)]
pub struct CadModelMetadata {
  pub model_identifier: ModelIdentifier,
  /// Base URL the repository resolves sector file names against.
  pub model_base_url: String,
  /// Model-to-world transform.
  pub model_matrix: DMat4,
  /// Optional box restricting which geometry is loaded at all.
  pub geometry_clip_box: Option<Aabb3>,
  /// The model's immutable sector hierarchy.
  pub scene: Arc<SectorScene>,
}

/// A region the caller wants loaded at elevated priority.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrioritizedArea {
  /// World-space region.
  pub area: Aabb3,
  /// Priority added to sectors intersecting the region.
  pub extra_priority: f64,
}

// =============================================================================
// Wanted / consumed sectors
// =============================================================================

/// A request to ensure a specific sector is materialized at a specific
/// level of detail. Produced by the taken-sector bookkeeping, consumed by
/// the loader.
#[derive(Clone)]
pub struct WantedSector {
  pub model_identifier: ModelIdentifier,
  pub model_base_url: String,
  pub geometry_clip_box: Option<Aabb3>,
  pub level_of_detail: LevelOfDetail,
  pub scene: Arc<SectorScene>,
  pub sector_id: SectorId,
}

impl WantedSector {
  /// Metadata of the referenced sector.
  pub fn metadata(&self) -> &SectorMetadata {
    self.scene.sector(self.sector_id)
  }
}

impl std::fmt::Debug for WantedSector {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WantedSector")
      .field("model", &self.model_identifier)
      .field("sector", &self.sector_id)
      .field("lod", &self.level_of_detail)
      .finish()
  }
}

/// A wanted sector with its culling priority.
///
/// Higher is more important; `f64::INFINITY` marks forced sectors (camera
/// proximity, prioritized areas) that must load regardless of budget.
#[derive(Clone, Debug)]
pub struct PrioritizedWantedSector {
  pub sector: WantedSector,
  pub priority: f64,
}

impl PrioritizedWantedSector {
  /// True for sectors that bypassed the budget check.
  pub fn is_forced(&self) -> bool {
    self.priority == f64::INFINITY
  }
}

/// Renderable geometry parsed from a sector file.
///
/// Opaque to this crate; the consumer hands it to the mesh builder.
#[derive(Clone, Default)]
pub struct SectorGeometry {
  /// Vertex data as raw bytes.
  pub vertices: Vec<u8>,
  /// Index data as raw bytes (u32 layout).
  pub indices: Vec<u8>,
  pub vertex_count: u32,
  pub index_count: u32,
}

impl std::fmt::Debug for SectorGeometry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SectorGeometry")
      .field("vertex_count", &self.vertex_count)
      .field("index_count", &self.index_count)
      .finish()
  }
}

/// One instanced mesh batch within a sector.
#[derive(Clone, Debug, Default)]
pub struct InstancedMesh {
  /// Template geometry this batch instances.
  pub template_id: u64,
  /// Column-major 4x4 transform per instance.
  pub instance_transforms: Vec<[f32; 16]>,
}

/// The settled result of loading (or failing to load) a wanted sector.
#[derive(Clone, Debug)]
pub struct ConsumedSector {
  pub model_identifier: ModelIdentifier,
  pub sector_id: SectorId,
  pub level_of_detail: LevelOfDetail,
  /// Parsed geometry; None for discarded sectors and empty sectors.
  pub group: Option<SectorGeometry>,
  pub instanced_meshes: Vec<InstancedMesh>,
}

impl ConsumedSector {
  /// The discarded result for a wanted sector, used both for unload
  /// requests and for failed loads.
  pub fn discarded(wanted: &WantedSector) -> Self {
    Self {
      model_identifier: wanted.model_identifier,
      sector_id: wanted.sector_id,
      level_of_detail: LevelOfDetail::Discarded,
      group: None,
      instanced_meshes: Vec::new(),
    }
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
