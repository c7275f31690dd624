//! Spatial model description: sector hierarchies and their bounds.

pub mod bounds;
pub mod metadata;

pub use bounds::Aabb3;
pub use metadata::{
  CoverageFactors, FacesFileReference, IndexFileReference, SectorId, SectorMetadata, SectorScene,
  SectorSceneBuilder,
};
