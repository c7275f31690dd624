use super::*;
use crate::scene::{SectorMetadata, SectorSceneBuilder};
use glam::DVec3;

#[test]
fn model_identifier_is_unique() {
  let a = ModelIdentifier::new();
  let b = ModelIdentifier::new();
  let c = ModelIdentifier::new();
  assert_ne!(a, b);
  assert_ne!(b, c);
  assert_ne!(a, c);
}

#[test]
fn sector_cost_adds_componentwise() {
  let a = SectorCost {
    download_size: 100,
    draw_calls: 3,
  };
  let b = SectorCost {
    download_size: 50,
    draw_calls: 2,
  };
  let sum = a + b;
  assert_eq!(sum.download_size, 150);
  assert_eq!(sum.draw_calls, 5);

  let mut acc = SectorCost::ZERO;
  acc += a;
  acc += b;
  assert_eq!(acc, sum);
}

#[test]
fn default_budget_is_the_documented_constant() {
  let budget = CadModelSectorBudget::default();
  assert_eq!(budget.geometry_download_size_bytes, 35 * 1024 * 1024);
  assert_eq!(budget.maximum_number_of_draw_calls, 2000);
  assert_eq!(budget.high_detail_proximity_threshold, 10.0);
}

#[test]
fn default_level_of_detail_is_discarded() {
  assert_eq!(LevelOfDetail::default(), LevelOfDetail::Discarded);
}

#[test]
fn forced_priority_detection() {
  let mut builder = SectorSceneBuilder::new();
  builder.add_root(SectorMetadata::new(crate::scene::Aabb3::new(
    DVec3::ZERO,
    DVec3::ONE,
  )));
  let scene = std::sync::Arc::new(builder.build());

  let wanted = WantedSector {
    model_identifier: ModelIdentifier::new(),
    model_base_url: String::new(),
    geometry_clip_box: None,
    level_of_detail: LevelOfDetail::Detailed,
    scene,
    sector_id: 0,
  };

  let forced = PrioritizedWantedSector {
    sector: wanted.clone(),
    priority: f64::INFINITY,
  };
  let ordinary = PrioritizedWantedSector {
    sector: wanted,
    priority: 12.5,
  };
  assert!(forced.is_forced());
  assert!(!ordinary.is_forced());
}

#[test]
fn discarded_consumed_sector_carries_no_geometry() {
  let mut builder = SectorSceneBuilder::new();
  builder.add_root(SectorMetadata::new(crate::scene::Aabb3::new(
    DVec3::ZERO,
    DVec3::ONE,
  )));
  let scene = std::sync::Arc::new(builder.build());

  let wanted = WantedSector {
    model_identifier: ModelIdentifier::new(),
    model_base_url: "https://example/model".to_owned(),
    geometry_clip_box: None,
    level_of_detail: LevelOfDetail::Detailed,
    scene,
    sector_id: 0,
  };

  let consumed = ConsumedSector::discarded(&wanted);
  assert_eq!(consumed.level_of_detail, LevelOfDetail::Discarded);
  assert_eq!(consumed.sector_id, wanted.sector_id);
  assert!(consumed.group.is_none());
  assert!(consumed.instanced_meshes.is_empty());
}
