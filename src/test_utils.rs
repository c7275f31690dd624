//! Shared fixtures for the crate's tests: a synthetic sector scene with
//! uniform file sizes, plus stub collaborators for the loader and the GPU
//! coverage culler.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use glam::{DMat4, DVec3};

use crate::camera::{Camera, PerspectiveProjection, Plane};
use crate::culling::gpu_visibility::{OrderSectorsByVisibilityCoverage, PrioritizedSector};
use crate::loader::{Repository, SectorLoadError};
use crate::scene::{
  Aabb3, CoverageFactors, SectorId, SectorMetadata, SectorScene, SectorSceneBuilder,
};
use crate::types::{
  CadModelMetadata, ConsumedSector, LevelOfDetail, ModelIdentifier, PrioritizedWantedSector,
  SectorGeometry, WantedSector,
};

pub const INDEX_DOWNLOAD_SIZE: u64 = 100;
pub const FACES_DOWNLOAD_SIZE: u64 = 10;
pub const SECTOR_DRAW_CALLS: u32 = 10;
pub const SECTOR_RENDER_COST: f32 = 1000.0;

fn test_sector(bounds: Aabb3, file_index: usize) -> SectorMetadata {
  SectorMetadata::new(bounds)
    .with_costs(SECTOR_DRAW_CALLS, SECTOR_RENDER_COST)
    .with_index_file(format!("sector_{file_index}.i3d"), INDEX_DOWNLOAD_SIZE)
    .with_faces_file(FACES_DOWNLOAD_SIZE, CoverageFactors::default())
}

/// Build a uniform scene: root bounds `[0, 16]^3`, each sector split into
/// `children_per_node` equal x-slabs, `levels` levels below the root.
///
/// Sectors are added breadth-first, so ids are breadth-first too: for
/// `build_test_scene(2, 2)` the layout is 0; 1, 2; 3, 4 (under 1); 5, 6
/// (under 2).
pub fn build_test_scene(levels: u32, children_per_node: usize) -> Arc<SectorScene> {
  let mut builder = SectorSceneBuilder::new();
  let root_bounds = Aabb3::new(DVec3::ZERO, DVec3::splat(16.0));
  let root = builder.add_root(test_sector(root_bounds, 0));

  let mut file_index = 1;
  let mut frontier = vec![(root, root_bounds)];
  for _ in 0..levels {
    let mut next = Vec::new();
    for (parent, bounds) in frontier {
      let width = (bounds.max.x - bounds.min.x) / children_per_node as f64;
      for i in 0..children_per_node {
        let min_x = bounds.min.x + width * i as f64;
        let child_bounds = Aabb3::new(
          DVec3::new(min_x, bounds.min.y, bounds.min.z),
          DVec3::new(min_x + width, bounds.max.y, bounds.max.z),
        );
        let id = builder.add_child(parent, test_sector(child_bounds, file_index));
        file_index += 1;
        next.push((id, child_bounds));
      }
    }
    frontier = next;
  }
  Arc::new(builder.build())
}

/// A model at the world origin wrapping the given scene.
pub fn test_model(scene: &Arc<SectorScene>) -> CadModelMetadata {
  CadModelMetadata {
    model_identifier: ModelIdentifier::new(),
    model_base_url: "https://models.test/primitives".to_owned(),
    model_matrix: DMat4::IDENTITY,
    geometry_clip_box: None,
    scene: Arc::clone(scene),
  }
}

pub fn wanted_sector(
  model: &CadModelMetadata,
  sector_id: SectorId,
  level_of_detail: LevelOfDetail,
) -> WantedSector {
  WantedSector {
    model_identifier: model.model_identifier,
    model_base_url: model.model_base_url.clone(),
    geometry_clip_box: model.geometry_clip_box,
    level_of_detail,
    scene: Arc::clone(&model.scene),
    sector_id,
  }
}

pub fn consumed_sector(
  model_identifier: ModelIdentifier,
  sector_id: SectorId,
  level_of_detail: LevelOfDetail,
) -> ConsumedSector {
  let group = match level_of_detail {
    LevelOfDetail::Discarded => None,
    _ => Some(SectorGeometry::default()),
  };
  ConsumedSector {
    model_identifier,
    sector_id,
    level_of_detail,
    group,
    instanced_meshes: Vec::new(),
  }
}

/// Camera at `position` looking at the scene center with the default
/// perspective projection.
pub fn camera_looking_at(position: DVec3, target: DVec3) -> Camera {
  Camera::look_at(position, target, DVec3::Y, PerspectiveProjection::default())
}

// =============================================================================
// Stub collaborators
// =============================================================================

/// Culler stub returning a canned decision; the filter drops a fixed id set.
pub struct StubCuller {
  pub wanted: Vec<PrioritizedWantedSector>,
  pub spent: crate::types::SectorLoadingSpent,
  pub filter_out: HashSet<SectorId>,
}

impl StubCuller {
  pub fn wanting(wanted: Vec<PrioritizedWantedSector>) -> Self {
    Self {
      wanted,
      spent: crate::types::SectorLoadingSpent::default(),
      filter_out: HashSet::new(),
    }
  }
}

impl crate::culling::SectorCuller for StubCuller {
  fn determine_sectors(
    &mut self,
    _input: &crate::culling::DetermineSectorsInput,
  ) -> crate::culling::DeterminedSectors {
    crate::culling::DeterminedSectors {
      wanted_sectors: self.wanted.clone(),
      spent_budget: self.spent,
    }
  }

  fn filter_sectors_to_load(
    &mut self,
    _input: &crate::culling::DetermineSectorsInput,
    candidates: Vec<PrioritizedWantedSector>,
  ) -> Vec<PrioritizedWantedSector> {
    candidates
      .into_iter()
      .filter(|c| !self.filter_out.contains(&c.sector.sector_id))
      .collect()
  }
}

/// Repository stub: fabricates geometry, records which sectors were
/// requested and fails on demand.
pub struct StubRepository {
  pub calls: Mutex<Vec<(ModelIdentifier, SectorId)>>,
  pub failing: Mutex<HashSet<SectorId>>,
  pub cleared: AtomicBool,
}

impl StubRepository {
  pub fn new() -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      failing: Mutex::new(HashSet::new()),
      cleared: AtomicBool::new(false),
    }
  }

  pub fn fail_sector(&self, sector_id: SectorId) {
    self.failing.lock().unwrap().insert(sector_id);
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }

  pub fn was_cleared(&self) -> bool {
    self.cleared.load(Ordering::SeqCst)
  }
}

impl Repository for StubRepository {
  fn load_sector(&self, wanted: &WantedSector) -> Result<ConsumedSector, SectorLoadError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((wanted.model_identifier, wanted.sector_id));
    if self.failing.lock().unwrap().contains(&wanted.sector_id) {
      return Err(SectorLoadError::Network {
        file_name: wanted.metadata().index_file.file_name.clone(),
        reason: "connection reset".to_owned(),
      });
    }
    Ok(consumed_sector(
      wanted.model_identifier,
      wanted.sector_id,
      wanted.level_of_detail,
    ))
  }

  fn clear(&self) {
    self.cleared.store(true, Ordering::SeqCst);
  }
}

/// Coverage stub feeding a fixed ordering to the GPU culler and dropping a
/// fixed set of sector ids during occlusion filtering.
pub struct StubCoverage {
  pub ordered: Vec<PrioritizedSector>,
  pub occluded: HashSet<SectorId>,
}

impl StubCoverage {
  pub fn new(ordered: Vec<PrioritizedSector>) -> Self {
    Self {
      ordered,
      occluded: HashSet::new(),
    }
  }
}

impl OrderSectorsByVisibilityCoverage for StubCoverage {
  fn set_models(&mut self, _models: &[CadModelMetadata]) {}

  fn set_clipping(&mut self, _planes: &[Plane]) {}

  fn order_sectors_by_visibility(&mut self, _camera: &Camera) -> Vec<PrioritizedSector> {
    self.ordered.clone()
  }

  fn cull_occluded_sectors(
    &mut self,
    _camera: &Camera,
    candidates: Vec<PrioritizedWantedSector>,
  ) -> Vec<PrioritizedWantedSector> {
    candidates
      .into_iter()
      .filter(|c| !self.occluded.contains(&c.sector.sector_id))
      .collect()
  }
}
