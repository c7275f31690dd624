use glam::DVec3;

use super::*;

fn unit_box(min: f64, max: f64) -> Aabb3 {
  Aabb3::new(DVec3::splat(min), DVec3::splat(max))
}

#[test]
fn builder_assigns_ids_depths_and_paths() {
  let mut builder = SectorSceneBuilder::new();
  let root = builder.add_root(SectorMetadata::new(unit_box(0.0, 8.0)));
  let a = builder.add_child(root, SectorMetadata::new(unit_box(0.0, 4.0)));
  let b = builder.add_child(root, SectorMetadata::new(unit_box(4.0, 8.0)));
  let aa = builder.add_child(a, SectorMetadata::new(unit_box(0.0, 2.0)));
  let scene = builder.build();

  assert_eq!(scene.sector_count(), 4);
  assert_eq!(scene.root_id(), root);
  assert_eq!(scene.sector(root).path, "0/");
  assert_eq!(scene.sector(a).path, "0/0/");
  assert_eq!(scene.sector(b).path, "0/1/");
  assert_eq!(scene.sector(aa).path, "0/0/0/");
  assert_eq!(scene.sector(aa).depth, 2);
  assert_eq!(scene.sector(aa).parent, Some(a));
  assert_eq!(scene.sector(root).children, vec![a, b]);
}

#[test]
fn metadata_builder_helpers() {
  let meta = SectorMetadata::new(unit_box(0.0, 1.0))
    .with_costs(12, 4000.0)
    .with_index_file("sector_0.i3d", 2048)
    .with_faces_file(
      512,
      CoverageFactors {
        xy: 0.5,
        yz: 0.25,
        xz: 0.75,
      },
    );

  assert_eq!(meta.estimated_draw_call_count, 12);
  assert_eq!(meta.index_file.file_name, "sector_0.i3d");
  assert_eq!(meta.index_file.download_size, 2048);
  assert_eq!(meta.faces_file.download_size, 512);
  assert_eq!(meta.faces_file.coverage_factors.yz, 0.25);
}

#[test]
fn traversal_prunes_rejected_subtrees() {
  // Root spanning [0, 8], left child [0, 4] with a grandchild, right [4, 8]
  let mut builder = SectorSceneBuilder::new();
  let root = builder.add_root(SectorMetadata::new(unit_box(0.0, 8.0)));
  let left = builder.add_child(root, SectorMetadata::new(unit_box(0.0, 4.0)));
  builder.add_child(left, SectorMetadata::new(unit_box(0.0, 2.0)));
  builder.add_child(root, SectorMetadata::new(unit_box(4.0, 8.0)));
  let scene = builder.build();

  // Accept only boxes touching [5, 7]^3: root and the right child
  let query = unit_box(5.0, 7.0);
  let mut visited = Vec::new();
  scene.for_each_intersecting(
    |bounds| bounds.overlaps(&query),
    |sector| visited.push(sector.id),
  );

  assert_eq!(visited.len(), 2);
  assert!(visited.contains(&root));
  assert!(!visited.contains(&left));
}

#[test]
#[should_panic(expected = "already has a root")]
fn double_root_panics() {
  let mut builder = SectorSceneBuilder::new();
  builder.add_root(SectorMetadata::new(unit_box(0.0, 1.0)));
  builder.add_root(SectorMetadata::new(unit_box(0.0, 1.0)));
}

#[test]
#[should_panic(expected = "unknown parent")]
fn unknown_parent_panics() {
  let mut builder = SectorSceneBuilder::new();
  builder.add_child(3, SectorMetadata::new(unit_box(0.0, 1.0)));
}
