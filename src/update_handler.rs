//! Top-level orchestrator tying camera updates to sector loading.
//!
//! The handler is driven by polling: callers push input changes (camera,
//! models, budget, hints) through the setters and call [`poll`] once per
//! frame. Every input change stamps a dirty timestamp; a new loading pass
//! starts only after the inputs have been stable for the debounce interval,
//! which coalesces bursts of camera updates into a single pass. [`poll`]
//! then drains whatever sectors have settled since the last call.
//!
//! [`poll`]: CadModelUpdateHandler::poll

use std::sync::Arc;
use std::time::Duration;

use web_time::Instant;

use crate::camera::{Camera, Plane};
use crate::culling::{DetermineSectorsInput, SectorCuller};
use crate::loader::{
  CollectStatisticsCallback, Repository, ReportProgressCallback, SectorLoader, SectorStream,
};
use crate::types::{
  CadLoadingHints, CadModelMetadata, CadModelSectorBudget, ConsumedSector, LoadingState,
  ModelIdentifier, PrioritizedArea,
};

/// Input-settle interval before a new loading pass starts.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Debounced, poll-driven loading orchestrator.
///
/// Owns the loader and the full culling input; one instance per viewer.
pub struct CadModelUpdateHandler {
  loader: SectorLoader,
  models: Vec<CadModelMetadata>,
  camera: Option<Camera>,
  camera_in_motion: bool,
  clipping_planes: Vec<Plane>,
  loading_hints: CadLoadingHints,
  budget: CadModelSectorBudget,
  prioritized_areas: Vec<PrioritizedArea>,
  debounce: Duration,
  dirty_since: Option<Instant>,
  stream: Option<SectorStream>,
}

impl CadModelUpdateHandler {
  pub fn new(culler: Box<dyn SectorCuller>, repository: Arc<dyn Repository>) -> Self {
    Self::with_debounce(culler, repository, DEFAULT_DEBOUNCE)
  }

  /// Like [`new`](Self::new) with an explicit debounce interval.
  pub fn with_debounce(
    culler: Box<dyn SectorCuller>,
    repository: Arc<dyn Repository>,
    debounce: Duration,
  ) -> Self {
    Self {
      loader: SectorLoader::new(culler, repository),
      models: Vec::new(),
      camera: None,
      camera_in_motion: false,
      clipping_planes: Vec::new(),
      loading_hints: CadLoadingHints::default(),
      budget: CadModelSectorBudget::DEFAULT,
      prioritized_areas: Vec::new(),
      debounce,
      dirty_since: None,
      stream: None,
    }
  }

  fn mark_dirty(&mut self) {
    self.dirty_since = Some(Instant::now());
    // The in-flight pass is superseded by the new inputs; its unsettled
    // fetches are abandoned without updating model state
    self.stream = None;
  }

  // ===========================================================================
  // Input setters
  // ===========================================================================

  pub fn update_camera(&mut self, camera: Camera) {
    self.camera = Some(camera);
    self.mark_dirty();
  }

  /// Flag camera animation. While set, no new pass starts; clearing the
  /// flag rearms the debounce so loading resumes from the rest pose.
  pub fn set_camera_in_motion(&mut self, in_motion: bool) {
    self.camera_in_motion = in_motion;
    self.mark_dirty();
  }

  pub fn set_clipping_planes(&mut self, planes: Vec<Plane>) {
    self.clipping_planes = planes;
    self.mark_dirty();
  }

  pub fn update_loading_hints(&mut self, hints: CadLoadingHints) {
    self.loading_hints = hints;
    self.mark_dirty();
  }

  pub fn set_budget(&mut self, budget: CadModelSectorBudget) {
    self.budget = budget;
    self.mark_dirty();
  }

  pub fn budget(&self) -> CadModelSectorBudget {
    self.budget
  }

  pub fn set_prioritized_areas(&mut self, areas: Vec<PrioritizedArea>) {
    self.prioritized_areas = areas;
    self.mark_dirty();
  }

  /// Register a model for loading.
  ///
  /// # Panics
  /// Panics if the model identifier is already registered.
  pub fn add_model(&mut self, metadata: CadModelMetadata) {
    self
      .loader
      .state_handler()
      .lock()
      .unwrap()
      .add_model(metadata.model_identifier);
    self.models.push(metadata);
    self.mark_dirty();
  }

  /// Deregister a model. In-flight sectors of the model settle as silent
  /// no-ops.
  ///
  /// # Panics
  /// Panics if the model was never registered.
  pub fn remove_model(&mut self, model: ModelIdentifier) {
    self.loader.state_handler().lock().unwrap().remove_model(model);
    self.models.retain(|m| m.model_identifier != model);
    self.mark_dirty();
  }

  pub fn set_statistics_callback(&mut self, callback: CollectStatisticsCallback) {
    self.loader.set_statistics_callback(callback);
  }

  pub fn set_progress_callback(&mut self, callback: ReportProgressCallback) {
    self.loader.set_progress_callback(callback);
  }

  // ===========================================================================
  // Polling
  // ===========================================================================

  /// Advance the pipeline and return the sectors that settled since the
  /// last call. Call once per frame.
  pub fn poll(&mut self) -> Vec<ConsumedSector> {
    if self.should_start_pass() {
      if let Some(camera) = self.camera {
        self.dirty_since = None;
        let input = self.build_input(camera);
        self.stream = Some(self.loader.load_sectors(&input));
      }
    }

    let mut settled = Vec::new();
    if let Some(stream) = &mut self.stream {
      while let Some(consumed) = stream.try_next() {
        settled.push(consumed);
      }
      if stream.is_exhausted() {
        self.stream = None;
      }
    }
    settled
  }

  /// Progress of the in-flight pass, or the idle snapshot.
  pub fn loading_state(&self) -> LoadingState {
    match &self.stream {
      Some(stream) => LoadingState {
        items_requested: stream.requested(),
        items_loaded: stream.loaded(),
        items_culled: stream.culled(),
        is_loading: !stream.is_exhausted(),
      },
      None => LoadingState::default(),
    }
  }

  fn should_start_pass(&self) -> bool {
    if self.models.is_empty()
      || self.camera.is_none()
      || self.camera_in_motion
      || self.loading_hints.suspend_loading
    {
      return false;
    }
    match self.dirty_since {
      Some(since) => since.elapsed() >= self.debounce,
      None => false,
    }
  }

  fn build_input(&self, camera: Camera) -> DetermineSectorsInput {
    DetermineSectorsInput {
      camera,
      clipping_planes: self.clipping_planes.clone(),
      cad_models_metadata: self.models.clone(),
      loading_hints: self.loading_hints,
      camera_in_motion: self.camera_in_motion,
      budget: self.budget,
      prioritized_areas: self.prioritized_areas.clone(),
    }
  }
}

impl Drop for CadModelUpdateHandler {
  /// Dropping the handler releases the repository's caches.
  fn drop(&mut self) {
    self.loader.repository().clear();
  }
}

#[cfg(test)]
#[path = "update_handler_test.rs"]
mod update_handler_test;
