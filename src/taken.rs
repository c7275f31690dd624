//! Per-pass bookkeeping of which sector to load at which level of detail.
//!
//! A [`TakenSectorMap`] is created fresh at the start of every culling pass
//! and discarded after producing the wanted sectors and spend accounting
//! for that pass. Each model gets a flat mark array indexed by its dense
//! sector ids; aggregate costs are kept as incremental running totals so
//! the budget check is O(1).
//!
//! Marking a sector detailed takes its whole root path detailed (parents
//! must be present for the renderer to cover holes between levels), and
//! non-detailed children of every detailed sector are taken simple so the
//! low-detail faces representation fills in around detailed geometry.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::scene::{Aabb3, SectorId, SectorMetadata, SectorScene};
use crate::types::{
  CadModelMetadata, CadModelSectorBudget, LevelOfDetail, ModelIdentifier,
  PrioritizedWantedSector, SectorCost, SectorLoadingSpent, WantedSector,
};
use std::sync::Arc;

/// Injectable cost model: what loading one sector at one level of detail
/// costs against the budget.
pub type DetermineSectorCost = fn(&SectorMetadata, LevelOfDetail) -> SectorCost;

/// Default cost model: detailed = index file + estimated draw calls,
/// simple = faces file + a single draw call.
pub fn default_sector_cost(metadata: &SectorMetadata, lod: LevelOfDetail) -> SectorCost {
  match lod {
    LevelOfDetail::Detailed => SectorCost {
      download_size: metadata.index_file.download_size,
      draw_calls: metadata.estimated_draw_call_count,
    },
    LevelOfDetail::Simple => SectorCost {
      download_size: metadata.faces_file.download_size,
      draw_calls: 1,
    },
    LevelOfDetail::Discarded => SectorCost::ZERO,
  }
}

/// Priority recorded for sectors nothing asked for.
const DISCARDED_PRIORITY: f64 = -1.0;

#[derive(Clone, Copy)]
struct SectorMark {
  lod: LevelOfDetail,
  priority: f64,
}

impl Default for SectorMark {
  fn default() -> Self {
    Self {
      lod: LevelOfDetail::Discarded,
      priority: DISCARDED_PRIORITY,
    }
  }
}

/// Taken-sector decisions for one model, mirroring its sector arena.
struct TakenSectorTree {
  model_base_url: String,
  geometry_clip_box: Option<Aabb3>,
  scene: Arc<SectorScene>,
  marks: Vec<SectorMark>,
}

impl TakenSectorTree {
  fn new(model: &CadModelMetadata) -> Self {
    Self {
      model_base_url: model.model_base_url.clone(),
      geometry_clip_box: model.geometry_clip_box,
      scene: Arc::clone(&model.scene),
      marks: vec![SectorMark::default(); model.scene.sector_count()],
    }
  }

  fn reset(&mut self) {
    self.marks.fill(SectorMark::default());
  }
}

/// Transient, per-pass map from model to taken-sector tree with global
/// running cost totals.
pub struct TakenSectorMap {
  determine_cost: DetermineSectorCost,
  models: HashMap<ModelIdentifier, TakenSectorTree>,
  total_cost: SectorCost,
  total_render_cost: f64,
}

impl TakenSectorMap {
  pub fn new(determine_cost: DetermineSectorCost) -> Self {
    Self {
      determine_cost,
      models: HashMap::new(),
      total_cost: SectorCost::ZERO,
      total_render_cost: 0.0,
    }
  }

  pub fn with_default_cost() -> Self {
    Self::new(default_sector_cost)
  }

  /// Create the per-model tree. Must precede any mark for that model.
  pub fn initialize_scene(&mut self, model: &CadModelMetadata) {
    self
      .models
      .insert(model.model_identifier, TakenSectorTree::new(model));
  }

  /// Record the decision to load a sector detailed at the given priority.
  ///
  /// Takes the whole root path detailed and the path's non-detailed
  /// children simple. Repeated marks are idempotent in cost; priorities
  /// accumulate as a max.
  ///
  /// # Panics
  /// Panics if [`initialize_scene`] was not called for the model.
  ///
  /// [`initialize_scene`]: TakenSectorMap::initialize_scene
  pub fn mark_sector_detailed(
    &mut self,
    model: ModelIdentifier,
    sector_id: SectorId,
    priority: f64,
  ) {
    let tree = self
      .models
      .get_mut(&model)
      .unwrap_or_else(|| panic!("mark_sector_detailed before initialize_scene for {model:?}"));

    // Root path, target first; order does not matter for marking
    let mut path: SmallVec<[SectorId; 16]> = SmallVec::new();
    let mut current = Some(sector_id);
    while let Some(id) = current {
      path.push(id);
      current = tree.scene.sector(id).parent;
    }

    for id in path {
      let metadata = tree.scene.sector(id);
      let mark = &mut tree.marks[id as usize];
      mark.priority = mark.priority.max(priority);

      if mark.lod != LevelOfDetail::Detailed {
        if mark.lod == LevelOfDetail::Simple {
          let simple = (self.determine_cost)(metadata, LevelOfDetail::Simple);
          self.total_cost.download_size -= simple.download_size;
          self.total_cost.draw_calls -= simple.draw_calls;
        }
        mark.lod = LevelOfDetail::Detailed;
        self.total_cost += (self.determine_cost)(metadata, LevelOfDetail::Detailed);
        self.total_render_cost += metadata.estimated_render_cost as f64;
      }

      // Fill in around the detailed sector with the low-detail stand-ins
      for &child in &metadata.children {
        let child_mark = &mut tree.marks[child as usize];
        if child_mark.lod == LevelOfDetail::Discarded {
          child_mark.lod = LevelOfDetail::Simple;
          child_mark.priority = child_mark.priority.max(priority);
          self.total_cost += (self.determine_cost)(tree.scene.sector(child), LevelOfDetail::Simple);
        }
      }
    }
  }

  /// Greedy-loop continuation condition: strictly below the download and
  /// draw-call ceilings. The caller may take one sector that lands exactly
  /// at (or beyond) the budget before the next check fails.
  pub fn is_within_budget(&self, budget: &CadModelSectorBudget) -> bool {
    self.total_cost.download_size < budget.geometry_download_size_bytes
      && self.total_cost.draw_calls < budget.maximum_number_of_draw_calls
  }

  /// Running total of estimated render cost over detailed sectors.
  pub fn spent_render_cost(&self) -> f64 {
    self.total_render_cost
  }

  /// Running componentwise cost total.
  pub fn total_cost(&self) -> SectorCost {
    self.total_cost
  }

  /// Flatten all per-model trees into one list with the final level of
  /// detail per sector (unmarked sectors surface as `Discarded`), sorted
  /// descending by priority.
  pub fn collect_wanted_sectors(&self) -> Vec<PrioritizedWantedSector> {
    let mut wanted = Vec::new();
    for (&model, tree) in &self.models {
      for (id, mark) in tree.marks.iter().enumerate() {
        wanted.push(PrioritizedWantedSector {
          sector: WantedSector {
            model_identifier: model,
            model_base_url: tree.model_base_url.clone(),
            geometry_clip_box: tree.geometry_clip_box,
            level_of_detail: mark.lod,
            scene: Arc::clone(&tree.scene),
            sector_id: id as SectorId,
          },
          priority: mark.priority,
        });
      }
    }
    wanted.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    wanted
  }

  /// Derive the spend accounting snapshot from the current marks.
  pub fn compute_spent_budget(&self) -> SectorLoadingSpent {
    let mut spent = SectorLoadingSpent {
      download_size: self.total_cost.download_size,
      draw_calls: self.total_cost.draw_calls,
      render_cost: self.total_render_cost,
      ..SectorLoadingSpent::default()
    };
    for tree in self.models.values() {
      spent.total_sector_count += tree.marks.len();
      for mark in &tree.marks {
        match mark.lod {
          LevelOfDetail::Discarded => continue,
          LevelOfDetail::Simple => spent.simple_sector_count += 1,
          LevelOfDetail::Detailed => {
            spent.detailed_sector_count += 1;
            if mark.priority == f64::INFINITY {
              spent.forced_detailed_sector_count += 1;
            }
          }
        }
        spent.loaded_sector_count += 1;
        if mark.priority.is_finite() && mark.priority > 0.0 {
          spent.accumulated_priority += mark.priority;
        }
      }
    }
    spent
  }

  /// Reset all per-model trees and totals for the next pass.
  pub fn clear(&mut self) {
    for tree in self.models.values_mut() {
      tree.reset();
    }
    self.total_cost = SectorCost::ZERO;
    self.total_render_cost = 0.0;
  }
}

#[cfg(test)]
#[path = "taken_test.rs"]
mod taken_test;
