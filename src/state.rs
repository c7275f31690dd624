//! Ground truth of which sectors are currently materialized per model.
//!
//! The orchestrator consults this map to avoid re-fetching sectors whose
//! desired state already matches reality, and updates it as consumed
//! sectors arrive from the loader.

use std::collections::HashMap;

use crate::scene::SectorId;
use crate::types::{ConsumedSector, LevelOfDetail, ModelIdentifier, WantedSector};

/// Per-model map from sector id to currently-loaded level of detail.
///
/// Entries are kept sparse: a `Discarded` level is represented by absence,
/// never stored. A model must be registered with [`add_model`] before any
/// lookup; registration bugs are programmer errors and panic.
///
/// [`add_model`]: ModelStateHandler::add_model
#[derive(Debug, Default)]
pub struct ModelStateHandler {
  models: HashMap<ModelIdentifier, HashMap<SectorId, LevelOfDetail>>,
}

impl ModelStateHandler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a model with an empty sector state.
  ///
  /// # Panics
  /// Panics if the model is already registered.
  pub fn add_model(&mut self, model: ModelIdentifier) {
    let previous = self.models.insert(model, HashMap::new());
    assert!(previous.is_none(), "model {model:?} added twice");
  }

  /// Deregister a model, dropping all of its sector state.
  ///
  /// # Panics
  /// Panics if the model is not registered.
  pub fn remove_model(&mut self, model: ModelIdentifier) {
    let removed = self.models.remove(&model);
    assert!(removed.is_some(), "model {model:?} removed but never added");
  }

  /// True when the model is currently registered.
  pub fn has_model(&self, model: ModelIdentifier) -> bool {
    self.models.contains_key(&model)
  }

  /// True when the wanted sector's level of detail differs from what is
  /// currently recorded (absence counts as `Discarded`).
  ///
  /// # Panics
  /// Panics if the wanted sector's model is not registered.
  pub fn has_state_changed(&self, wanted: &WantedSector) -> bool {
    let sectors = self
      .models
      .get(&wanted.model_identifier)
      .unwrap_or_else(|| panic!("state lookup for unregistered model {:?}", wanted.model_identifier));
    let current = sectors
      .get(&wanted.sector_id)
      .copied()
      .unwrap_or(LevelOfDetail::Discarded);
    current != wanted.level_of_detail
  }

  /// Record the new level of detail for a settled sector.
  ///
  /// `Discarded` removes the entry. An update for an unregistered model is
  /// a silent no-op: in-flight loads can legitimately settle after their
  /// model was removed.
  pub fn update_state(&mut self, consumed: &ConsumedSector) {
    let Some(sectors) = self.models.get_mut(&consumed.model_identifier) else {
      return;
    };
    match consumed.level_of_detail {
      LevelOfDetail::Discarded => {
        sectors.remove(&consumed.sector_id);
      }
      lod => {
        sectors.insert(consumed.sector_id, lod);
      }
    }
  }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;
