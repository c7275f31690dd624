//! Asynchronous sector loading.
//!
//! One call to [`SectorLoader::load_sectors`] runs one pass: the injected
//! culler decides the wanted-sector set, already-satisfied sectors are
//! skipped, the rest are dispatched to the repository on rayon workers and
//! their results flow back through a bounded channel as a finite
//! [`SectorStream`]. A fresh call is required per pass.
//!
//! Failures are isolated per sector: a rejected load becomes a `Discarded`
//! consumed sector and the rest of the batch proceeds.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{self as channel, Receiver, TryRecvError};
use thiserror::Error;

use crate::culling::{DetermineSectorsInput, SectorCuller};
use crate::state::ModelStateHandler;
use crate::types::{ConsumedSector, LevelOfDetail, SectorLoadingSpent, WantedSector};

/// Why a single sector failed to load. Never aborts a batch.
#[derive(Debug, Error)]
pub enum SectorLoadError {
  #[error("network error fetching {file_name}: {reason}")]
  Network { file_name: String, reason: String },
  #[error("failed to parse sector file {file_name}: {reason}")]
  Parse { file_name: String, reason: String },
  #[error("sector load cancelled")]
  Cancelled,
}

/// Fetch/parse/transform collaborator turning a wanted sector into
/// renderable geometry. Implementations live in the network layer, out of
/// scope here.
pub trait Repository: Send + Sync {
  fn load_sector(&self, wanted: &WantedSector) -> Result<ConsumedSector, SectorLoadError>;
  /// Drop any cached sector data.
  fn clear(&self);
}

/// Called once per pass with the culler's spend accounting.
pub type CollectStatisticsCallback = Arc<dyn Fn(SectorLoadingSpent) + Send + Sync>;
/// Called after each settled sector with (loaded, requested, culled).
pub type ReportProgressCallback = Arc<dyn Fn(u32, u32, u32) + Send + Sync>;

/// Streams wanted sectors through the repository, one pass at a time.
pub struct SectorLoader {
  culler: Box<dyn SectorCuller>,
  repository: Arc<dyn Repository>,
  state: Arc<Mutex<ModelStateHandler>>,
  collect_statistics: Option<CollectStatisticsCallback>,
  report_progress: Option<ReportProgressCallback>,
}

impl SectorLoader {
  pub fn new(culler: Box<dyn SectorCuller>, repository: Arc<dyn Repository>) -> Self {
    Self {
      culler,
      repository,
      state: Arc::new(Mutex::new(ModelStateHandler::new())),
      collect_statistics: None,
      report_progress: None,
    }
  }

  /// Shared model-state ground truth, also updated by the streams this
  /// loader produces.
  pub fn state_handler(&self) -> Arc<Mutex<ModelStateHandler>> {
    Arc::clone(&self.state)
  }

  pub fn repository(&self) -> Arc<dyn Repository> {
    Arc::clone(&self.repository)
  }

  pub fn set_statistics_callback(&mut self, callback: CollectStatisticsCallback) {
    self.collect_statistics = Some(callback);
  }

  pub fn set_progress_callback(&mut self, callback: ReportProgressCallback) {
    self.report_progress = Some(callback);
  }

  /// Run one loading pass.
  ///
  /// Yields nothing when there are no models or the camera is in motion.
  /// The culling decision completes synchronously before any fetch is
  /// dispatched; fetches then settle in arbitrary order.
  #[cfg_attr(
    feature = "tracing",
    tracing::instrument(skip_all, name = "loader::load_sectors")
  )]
  pub fn load_sectors(&mut self, input: &DetermineSectorsInput) -> SectorStream {
    if input.cad_models_metadata.is_empty() || input.camera_in_motion {
      return SectorStream::empty(Arc::clone(&self.state), self.report_progress.clone());
    }

    let determined = self.culler.determine_sectors(input);
    if let Some(callback) = &self.collect_statistics {
      callback(determined.spent_budget);
    }

    // Skip sectors whose recorded state already matches the wish; this is
    // the sole content-based deduplication in the pipeline.
    let changed: Vec<_> = {
      let state = self.state.lock().unwrap();
      determined
        .wanted_sectors
        .into_iter()
        .filter(|wanted| state.has_state_changed(&wanted.sector))
        .collect()
    };

    let before_filter = changed.len();
    let to_load = self.culler.filter_sectors_to_load(input, changed);
    let culled = (before_filter - to_load.len()) as u32;
    let requested = to_load.len() as u32;

    // Capacity covers every dispatched sector, so worker sends never block
    let (sender, receiver) = channel::bounded(to_load.len().max(1));
    let mut remaining = 0usize;

    for prioritized in to_load {
      let wanted = prioritized.sector;
      remaining += 1;

      if wanted.level_of_detail == LevelOfDetail::Discarded {
        // Unload request: nothing to fetch, settle inline
        let _ = sender.send(ConsumedSector::discarded(&wanted));
        continue;
      }

      let repository = Arc::clone(&self.repository);
      let result_sender = sender.clone();
      rayon::spawn(move || {
        let consumed = match repository.load_sector(&wanted) {
          Ok(consumed) => consumed,
          Err(_error) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(
              sector = wanted.sector_id,
              model = wanted.model_identifier.raw(),
              error = %_error,
              "sector load failed, discarding"
            );
            ConsumedSector::discarded(&wanted)
          }
        };
        // Receiver dropped means the pass was abandoned
        let _ = result_sender.send(consumed);
      });
    }

    SectorStream {
      receiver: Some(receiver),
      remaining,
      requested,
      culled,
      loaded: 0,
      state: Arc::clone(&self.state),
      report_progress: self.report_progress.clone(),
    }
  }
}

/// Finite stream of consumed sectors for one loading pass.
///
/// Each yielded sector has already had its model state recorded; dropping
/// the stream abandons unsettled fetches (they run to completion on the
/// workers, their results are discarded).
pub struct SectorStream {
  receiver: Option<Receiver<ConsumedSector>>,
  remaining: usize,
  requested: u32,
  culled: u32,
  loaded: u32,
  state: Arc<Mutex<ModelStateHandler>>,
  report_progress: Option<ReportProgressCallback>,
}

impl SectorStream {
  fn empty(
    state: Arc<Mutex<ModelStateHandler>>,
    report_progress: Option<ReportProgressCallback>,
  ) -> Self {
    Self {
      receiver: None,
      remaining: 0,
      requested: 0,
      culled: 0,
      loaded: 0,
      state,
      report_progress,
    }
  }

  /// Sectors dispatched this pass.
  pub fn requested(&self) -> u32 {
    self.requested
  }

  /// Sectors removed by occlusion filtering this pass.
  pub fn culled(&self) -> u32 {
    self.culled
  }

  /// Sectors settled so far.
  pub fn loaded(&self) -> u32 {
    self.loaded
  }

  /// True once every dispatched sector has been yielded.
  pub fn is_exhausted(&self) -> bool {
    self.remaining == 0
  }

  /// Non-blocking poll for the next settled sector.
  pub fn try_next(&mut self) -> Option<ConsumedSector> {
    if self.remaining == 0 {
      return None;
    }
    let receiver = self.receiver.as_ref()?;
    match receiver.try_recv() {
      Ok(consumed) => Some(self.settle(consumed)),
      Err(TryRecvError::Empty) => None,
      Err(TryRecvError::Disconnected) => {
        self.remaining = 0;
        None
      }
    }
  }

  /// State update happens here, exactly once per sector, after its own
  /// fetch settled.
  fn settle(&mut self, consumed: ConsumedSector) -> ConsumedSector {
    self.remaining -= 1;
    self.loaded += 1;
    self.state.lock().unwrap().update_state(&consumed);
    if let Some(callback) = &self.report_progress {
      callback(self.loaded, self.requested, self.culled);
    }
    consumed
  }
}

impl Iterator for SectorStream {
  type Item = ConsumedSector;

  /// Blocking variant of [`SectorStream::try_next`].
  fn next(&mut self) -> Option<ConsumedSector> {
    if self.remaining == 0 {
      return None;
    }
    let receiver = self.receiver.as_ref()?;
    match receiver.recv() {
      Ok(consumed) => Some(self.settle(consumed)),
      Err(_) => {
        self.remaining = 0;
        None
      }
    }
  }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;
