//! cad_streaming - Sector-based streaming of large CAD models
//!
//! Plant-scale CAD models are partitioned server-side into a tree of
//! sectors, each with a detailed representation and a low-detail quad
//! stand-in. This crate decides, per camera pose and resource budget, which
//! sectors to hold at which level of detail, and streams the resulting
//! load/unload work through a pluggable repository.
//!
//! # Overview
//!
//! - **Culling**: [`ByScreenSizeSectorCuller`] (CPU screen-size heuristic)
//!   and [`ByVisibilityGpuSectorCuller`] (GPU coverage ordering) decide the
//!   wanted-sector set within a [`CadModelSectorBudget`]
//! - **Loading**: [`SectorLoader`] runs one pass per call, fetching sectors
//!   in parallel and yielding them as a finite stream
//! - **Orchestration**: [`CadModelUpdateHandler`] debounces input changes
//!   and drives the loader from a per-frame [`poll`]
//!
//! # Example
//!
//! ```ignore
//! use cad_streaming::{
//!     ByScreenSizeSectorCuller, CadModelUpdateHandler,
//! };
//!
//! let mut handler = CadModelUpdateHandler::new(
//!     Box::new(ByScreenSizeSectorCuller::new()),
//!     repository,
//! );
//! handler.add_model(metadata);
//!
//! // Per frame:
//! handler.update_camera(camera);
//! for sector in handler.poll() {
//!     apply_to_scene_graph(sector);
//! }
//! ```
//!
//! [`poll`]: CadModelUpdateHandler::poll

// Sector hierarchies and bounds
pub mod scene;
pub use scene::{
  Aabb3, CoverageFactors, FacesFileReference, IndexFileReference, SectorId, SectorMetadata,
  SectorScene, SectorSceneBuilder,
};

// Camera, frustum and clipping planes
pub mod camera;
pub use camera::{Camera, Frustum, PerspectiveProjection, Plane};

// Core value types flowing through the pipeline
pub mod types;
pub use types::{
  CadLoadingHints, CadModelMetadata, CadModelSectorBudget, ConsumedSector, InstancedMesh,
  LevelOfDetail, LoadingState, ModelIdentifier, PrioritizedArea, PrioritizedWantedSector,
  SectorCost, SectorGeometry, SectorLoadingSpent, WantedSector,
};

// Materialized-state ground truth
pub mod state;
pub use state::ModelStateHandler;

// Per-pass taken-sector bookkeeping
pub mod taken;
pub use taken::{default_sector_cost, DetermineSectorCost, TakenSectorMap};

// Culling strategies
pub mod culling;
pub use culling::{
  ByScreenSizeSectorCuller, ByVisibilityGpuSectorCuller, DetermineSectorsInput, DeterminedSectors,
  OrderSectorsByVisibilityCoverage, PrioritizedSector, SectorCuller,
};

// Parallel sector loading
pub mod loader;
pub use loader::{Repository, SectorLoadError, SectorLoader, SectorStream};

// Poll-driven orchestration
pub mod update_handler;
pub use update_handler::CadModelUpdateHandler;

#[cfg(test)]
pub mod test_utils;
