//! CPU-only culler ordering sectors by projected screen size.
//!
//! Priority weights both visible size and proximity:
//! `screen area / log2(2 + distance)`. The log damping keeps very close
//! sectors from dominating purely on projected size while still preferring
//! near sectors over far ones of similar screen size.

use crate::camera::{projected_screen_area, Frustum};
use crate::scene::SectorId;
use crate::taken::{default_sector_cost, DetermineSectorCost, TakenSectorMap};
use crate::types::ModelIdentifier;

use super::{DetermineSectorsInput, DeterminedSectors, SectorCuller};

struct Candidate {
  model: ModelIdentifier,
  sector: SectorId,
  priority: f64,
}

/// Screen-size-based sector culler.
///
/// Does not support clipping planes; passing any is a configuration error
/// and panics.
pub struct ByScreenSizeSectorCuller {
  determine_cost: DetermineSectorCost,
}

impl ByScreenSizeSectorCuller {
  pub fn new() -> Self {
    Self {
      determine_cost: default_sector_cost,
    }
  }

  /// Use a custom cost model instead of the file-size default.
  pub fn with_cost(determine_cost: DetermineSectorCost) -> Self {
    Self { determine_cost }
  }
}

impl Default for ByScreenSizeSectorCuller {
  fn default() -> Self {
    Self::new()
  }
}

impl SectorCuller for ByScreenSizeSectorCuller {
  #[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, name = "culling::by_screen_size")
  )]
  fn determine_sectors(&mut self, input: &DetermineSectorsInput) -> DeterminedSectors {
    assert!(
      input.clipping_planes.is_empty(),
      "clipping planes are not supported by ByScreenSizeSectorCuller"
    );

    let mut taken = TakenSectorMap::new(self.determine_cost);
    let mut candidates: Vec<Candidate> = Vec::new();
    let view_projection = input.camera.view_projection();

    for model in &input.cad_models_metadata {
      taken.initialize_scene(model);

      // Fold the model matrix into the clip transform so sector bounds can
      // be tested in model space directly.
      let model_to_clip = view_projection * model.model_matrix;
      let frustum = Frustum::from_matrix(&model_to_clip);
      let camera_in_model = model
        .model_matrix
        .inverse()
        .transform_point3(input.camera.position);
      let clip_box = model.geometry_clip_box;
      let model_matrix = model.model_matrix;

      model.scene.for_each_intersecting(
        |bounds| frustum.intersects_aabb(bounds),
        |sector| {
          if let Some(clip) = &clip_box {
            if !clip.overlaps(&sector.bounds) {
              return;
            }
          }

          let area = projected_screen_area(&model_to_clip, &sector.bounds);
          let distance = sector.bounds.distance_to_point(camera_in_model);
          let mut priority = area / (2.0 + distance).log2();

          if !input.prioritized_areas.is_empty() {
            let world_bounds = sector.bounds.transformed(&model_matrix);
            for prioritized in &input.prioritized_areas {
              if world_bounds.overlaps(&prioritized.area) {
                priority += prioritized.extra_priority;
              }
            }
          }

          candidates.push(Candidate {
            model: model.model_identifier,
            sector: sector.id,
            priority,
          });
        },
      );
    }

    candidates.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    // Greedy: budget checked before each take with strict <, so the pass
    // can overshoot by one sector and never backtracks.
    let render_budget = input.budget.maximum_render_cost as f64;
    for candidate in candidates {
      if taken.spent_render_cost() >= render_budget {
        break;
      }
      taken.mark_sector_detailed(candidate.model, candidate.sector, candidate.priority);
    }

    DeterminedSectors {
      wanted_sectors: taken.collect_wanted_sectors(),
      spent_budget: taken.compute_spent_budget(),
    }
  }
}

#[cfg(test)]
#[path = "screen_size_test.rs"]
mod screen_size_test;
