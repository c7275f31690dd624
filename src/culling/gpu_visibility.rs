//! Culler ordering sectors by GPU-estimated visible coverage.
//!
//! The expensive part, rasterizing sector bounds at low resolution to
//! estimate per-sector visible coverage, lives behind the
//! [`OrderSectorsByVisibilityCoverage`] collaborator. This module adds the
//! budget walk, the forced near-camera sectors and the clipping-plane
//! handling on top of that ordering.

use glam::DVec3;

use crate::camera::{Camera, Frustum, Plane};
use crate::scene::SectorId;
use crate::taken::{default_sector_cost, DetermineSectorCost, TakenSectorMap};
use crate::types::{CadModelMetadata, ModelIdentifier, PrioritizedWantedSector};

use super::{DetermineSectorsInput, DeterminedSectors, SectorCuller};

/// One sector in the coverage-ordered output, highest priority first.
/// `f64::INFINITY` is reserved for forced sectors.
#[derive(Clone, Copy, Debug)]
pub struct PrioritizedSector {
  pub model_identifier: ModelIdentifier,
  pub sector_id: SectorId,
  pub priority: f64,
}

/// GPU coverage collaborator (implementation out of scope for this crate):
/// renders sector bounds at low resolution and orders sectors by visible
/// coverage; also occlusion-culls candidate sectors against already-loaded
/// geometry.
pub trait OrderSectorsByVisibilityCoverage {
  fn set_models(&mut self, models: &[CadModelMetadata]);
  fn set_clipping(&mut self, planes: &[Plane]);
  /// Sectors ordered descending by estimated visible coverage.
  fn order_sectors_by_visibility(&mut self, camera: &Camera) -> Vec<PrioritizedSector>;
  /// Remove candidates occluded by already-loaded geometry.
  fn cull_occluded_sectors(
    &mut self,
    camera: &Camera,
    candidates: Vec<PrioritizedWantedSector>,
  ) -> Vec<PrioritizedWantedSector>;
}

/// GPU-visibility-ordered, budget-aware culler with clipping support.
pub struct ByVisibilityGpuSectorCuller {
  coverage: Box<dyn OrderSectorsByVisibilityCoverage>,
  determine_cost: DetermineSectorCost,
}

impl ByVisibilityGpuSectorCuller {
  pub fn new(coverage: Box<dyn OrderSectorsByVisibilityCoverage>) -> Self {
    Self {
      coverage,
      determine_cost: default_sector_cost,
    }
  }

  /// Use a custom cost model instead of the file-size default.
  pub fn with_cost(
    coverage: Box<dyn OrderSectorsByVisibilityCoverage>,
    determine_cost: DetermineSectorCost,
  ) -> Self {
    Self {
      coverage,
      determine_cost,
    }
  }

  /// Sectors near or inside the camera are never culled away by budget
  /// exhaustion: everything intersecting the short-range frustum (and
  /// everything touching a prioritized area) is force-marked detailed.
  fn collect_forced_sectors(
    input: &DetermineSectorsInput,
  ) -> Vec<(ModelIdentifier, SectorId)> {
    let mut forced = Vec::new();
    let near_camera = input
      .camera
      .with_far_clamped(input.budget.high_detail_proximity_threshold);

    for model in &input.cad_models_metadata {
      let model_to_clip = near_camera.view_projection() * model.model_matrix;
      let frustum = Frustum::from_matrix(&model_to_clip);
      let model_matrix = model.model_matrix;
      let clipping = &input.clipping_planes;

      let accepted_by_clipping = |corners: &[DVec3; 8]| -> bool {
        clipping.iter().all(|plane| plane.accepts_corners(corners))
      };

      model.scene.for_each_intersecting(
        |bounds| {
          if !frustum.intersects_aabb(bounds) {
            return false;
          }
          if clipping.is_empty() {
            return true;
          }
          // Conservative: a fully clipped box clips its whole subtree,
          // since child bounds are contained in the parent's
          let mut corners = bounds.corners();
          for corner in &mut corners {
            *corner = model_matrix.transform_point3(*corner);
          }
          accepted_by_clipping(&corners)
        },
        |sector| forced.push((model.model_identifier, sector.id)),
      );

      for prioritized in &input.prioritized_areas {
        model.scene.for_each_intersecting(
          |bounds| bounds.transformed(&model_matrix).overlaps(&prioritized.area),
          |sector| forced.push((model.model_identifier, sector.id)),
        );
      }
    }
    forced
  }
}

impl SectorCuller for ByVisibilityGpuSectorCuller {
  #[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, name = "culling::by_gpu_visibility")
  )]
  fn determine_sectors(&mut self, input: &DetermineSectorsInput) -> DeterminedSectors {
    self.coverage.set_models(&input.cad_models_metadata);
    self.coverage.set_clipping(&input.clipping_planes);
    let ordered = self.coverage.order_sectors_by_visibility(&input.camera);

    let mut taken = TakenSectorMap::new(self.determine_cost);
    for model in &input.cad_models_metadata {
      taken.initialize_scene(model);
    }

    for (model, sector) in Self::collect_forced_sectors(input) {
      taken.mark_sector_detailed(model, sector, f64::INFINITY);
    }

    // Walk the coverage order while strictly under budget; forced entries
    // bypass the check entirely.
    for candidate in ordered {
      if candidate.priority == f64::INFINITY {
        taken.mark_sector_detailed(
          candidate.model_identifier,
          candidate.sector_id,
          candidate.priority,
        );
        continue;
      }
      if !taken.is_within_budget(&input.budget) {
        break;
      }
      taken.mark_sector_detailed(
        candidate.model_identifier,
        candidate.sector_id,
        candidate.priority,
      );
    }

    DeterminedSectors {
      wanted_sectors: taken.collect_wanted_sectors(),
      spent_budget: taken.compute_spent_budget(),
    }
  }

  fn filter_sectors_to_load(
    &mut self,
    input: &DetermineSectorsInput,
    candidates: Vec<PrioritizedWantedSector>,
  ) -> Vec<PrioritizedWantedSector> {
    // Only ordinary detailed candidates are worth occlusion-testing;
    // forced sectors and unload/simple requests pass through.
    let mut passthrough: Vec<PrioritizedWantedSector> = Vec::new();
    let mut to_test: Vec<PrioritizedWantedSector> = Vec::new();
    for candidate in candidates {
      let detailed = candidate.sector.level_of_detail == crate::types::LevelOfDetail::Detailed;
      if detailed && !candidate.is_forced() {
        to_test.push(candidate);
      } else {
        passthrough.push(candidate);
      }
    }

    let mut kept = self.coverage.cull_occluded_sectors(&input.camera, to_test);
    passthrough.append(&mut kept);
    passthrough.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    passthrough
  }
}

#[cfg(test)]
#[path = "gpu_visibility_test.rs"]
mod gpu_visibility_test;
