//! Immutable per-model sector hierarchy.
//!
//! A model's geometry is partitioned into an octree-like tree of sectors.
//! Each sector carries cost estimates for its detailed (index file) and
//! low-detail (faces file) representations. The tree is built once when the
//! model's metadata is parsed and never mutated afterwards.
//!
//! Sector ids are small dense integers per model, so the scene stores
//! sectors in a flat arena indexed by id instead of a boxed recursive tree.

use super::bounds::Aabb3;

/// Dense per-model sector index. Unique within one model only.
pub type SectorId = u32;

/// Reference to a sector's detailed-geometry file.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexFileReference {
  /// File name relative to the model base URL.
  pub file_name: String,
  /// Download size in bytes.
  pub download_size: u64,
}

/// Per-axis-pair coverage of the low-detail quad representation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoverageFactors {
  pub xy: f32,
  pub yz: f32,
  pub xz: f32,
}

/// Reference to a sector's low-detail (faces) file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacesFileReference {
  /// Download size in bytes.
  pub download_size: u64,
  /// Screen coverage estimates for the quad representation.
  pub coverage_factors: CoverageFactors,
}

/// Metadata for one sector of a model.
///
/// Immutable once the owning [`SectorScene`] is built. The `id`, `path`,
/// `depth`, `parent` and `children` fields are assigned by
/// [`SectorSceneBuilder`]; construct the rest with [`SectorMetadata::new`]
/// and the `with_*` helpers.
#[derive(Clone, Debug)]
pub struct SectorMetadata {
  /// Dense id, unique within the owning model.
  pub id: SectorId,
  /// Slash-separated path from the root, e.g. "0/2/1/".
  pub path: String,
  /// Tree depth; the root has depth 0.
  pub depth: u32,
  /// Sector bounds in model space.
  pub bounds: Aabb3,
  /// Heuristic draw-call count for the detailed representation.
  pub estimated_draw_call_count: u32,
  /// Heuristic render cost for the detailed representation.
  pub estimated_render_cost: f32,
  /// Detailed-geometry file reference.
  pub index_file: IndexFileReference,
  /// Low-detail quad file reference.
  pub faces_file: FacesFileReference,
  /// Parent sector, None for the root.
  pub parent: Option<SectorId>,
  /// Child sectors, ordered.
  pub children: Vec<SectorId>,
}

impl SectorMetadata {
  /// Create sector metadata with the given bounds and zeroed costs.
  ///
  /// Tree placement fields are filled in by the builder.
  pub fn new(bounds: Aabb3) -> Self {
    Self {
      id: 0,
      path: String::new(),
      depth: 0,
      bounds,
      estimated_draw_call_count: 0,
      estimated_render_cost: 0.0,
      index_file: IndexFileReference {
        file_name: String::new(),
        download_size: 0,
      },
      faces_file: FacesFileReference::default(),
      parent: None,
      children: Vec::new(),
    }
  }

  /// Set the detailed-representation cost estimates.
  pub fn with_costs(mut self, draw_calls: u32, render_cost: f32) -> Self {
    self.estimated_draw_call_count = draw_calls;
    self.estimated_render_cost = render_cost;
    self
  }

  /// Set the detailed-geometry file reference.
  pub fn with_index_file(mut self, file_name: impl Into<String>, download_size: u64) -> Self {
    self.index_file = IndexFileReference {
      file_name: file_name.into(),
      download_size,
    };
    self
  }

  /// Set the low-detail faces file reference.
  pub fn with_faces_file(mut self, download_size: u64, coverage_factors: CoverageFactors) -> Self {
    self.faces_file = FacesFileReference {
      download_size,
      coverage_factors,
    };
    self
  }
}

/// Immutable sector hierarchy for one model.
///
/// Owned by the model for the model's lifetime and shared as
/// `Arc<SectorScene>` with wanted-sector descriptors.
#[derive(Clone, Debug)]
pub struct SectorScene {
  sectors: Vec<SectorMetadata>,
  root: SectorId,
}

impl SectorScene {
  /// Total number of sectors in the model.
  pub fn sector_count(&self) -> usize {
    self.sectors.len()
  }

  /// The root sector id (depth 0).
  pub fn root_id(&self) -> SectorId {
    self.root
  }

  /// Look up a sector by id.
  ///
  /// # Panics
  /// Panics on an id not belonging to this scene; ids are only ever
  /// produced by this scene's builder, so a miss is an integration bug.
  pub fn sector(&self, id: SectorId) -> &SectorMetadata {
    &self.sectors[id as usize]
  }

  /// Iterate all sectors in id order.
  pub fn iter(&self) -> impl Iterator<Item = &SectorMetadata> {
    self.sectors.iter()
  }

  /// Bounds of the whole model (the root sector's bounds).
  pub fn model_bounds(&self) -> &Aabb3 {
    &self.sector(self.root).bounds
  }

  /// Visit every sector whose bounds pass `accepts`, pruning subtrees at
  /// the first rejected ancestor.
  ///
  /// Relies on the hierarchy invariant that child bounds are contained in
  /// their parent's bounds, so a rejected sector rejects its whole subtree.
  pub fn for_each_intersecting<P, V>(&self, mut accepts: P, mut visit: V)
  where
    P: FnMut(&Aabb3) -> bool,
    V: FnMut(&SectorMetadata),
  {
    let mut stack = vec![self.root];
    while let Some(id) = stack.pop() {
      let sector = self.sector(id);
      if !accepts(&sector.bounds) {
        continue;
      }
      visit(sector);
      stack.extend_from_slice(&sector.children);
    }
  }
}

/// Builder assigning dense ids, depths and paths while the model metadata
/// is parsed.
pub struct SectorSceneBuilder {
  sectors: Vec<SectorMetadata>,
}

impl SectorSceneBuilder {
  pub fn new() -> Self {
    Self {
      sectors: Vec::new(),
    }
  }

  /// Add the root sector.
  ///
  /// # Panics
  /// Panics if a root was already added.
  pub fn add_root(&mut self, mut metadata: SectorMetadata) -> SectorId {
    assert!(self.sectors.is_empty(), "scene already has a root sector");
    metadata.id = 0;
    metadata.depth = 0;
    metadata.parent = None;
    metadata.path = "0/".to_owned();
    metadata.children.clear();
    self.sectors.push(metadata);
    0
  }

  /// Add a child of an existing sector.
  ///
  /// # Panics
  /// Panics if `parent` was not returned by this builder.
  pub fn add_child(&mut self, parent: SectorId, mut metadata: SectorMetadata) -> SectorId {
    assert!(
      (parent as usize) < self.sectors.len(),
      "unknown parent sector {parent}"
    );
    let id = self.sectors.len() as SectorId;
    let (depth, path) = {
      let p = &self.sectors[parent as usize];
      (p.depth + 1, format!("{}{}/", p.path, p.children.len()))
    };
    metadata.id = id;
    metadata.depth = depth;
    metadata.parent = Some(parent);
    metadata.path = path;
    metadata.children.clear();
    self.sectors[parent as usize].children.push(id);
    self.sectors.push(metadata);
    id
  }

  /// Finish the scene.
  ///
  /// # Panics
  /// Panics if no root was added.
  pub fn build(self) -> SectorScene {
    assert!(!self.sectors.is_empty(), "scene must have a root sector");
    SectorScene {
      sectors: self.sectors,
      root: 0,
    }
  }
}

impl Default for SectorSceneBuilder {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
#[path = "metadata_test.rs"]
mod metadata_test;
