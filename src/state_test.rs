use super::*;
use crate::test_utils::{build_test_scene, consumed_sector, test_model, wanted_sector};

#[test]
fn absence_means_discarded() {
  let scene = build_test_scene(2, 2);
  let model = test_model(&scene);
  let mut state = ModelStateHandler::new();
  state.add_model(model.model_identifier);

  // Nothing loaded yet: a Discarded wish is already satisfied
  assert!(!state.has_state_changed(&wanted_sector(&model, 0, LevelOfDetail::Discarded)));
  assert!(state.has_state_changed(&wanted_sector(&model, 0, LevelOfDetail::Detailed)));
  assert!(state.has_state_changed(&wanted_sector(&model, 0, LevelOfDetail::Simple)));
}

#[test]
fn update_state_records_loaded_lod() {
  let scene = build_test_scene(2, 2);
  let model = test_model(&scene);
  let mut state = ModelStateHandler::new();
  state.add_model(model.model_identifier);

  state.update_state(&consumed_sector(
    model.model_identifier,
    1,
    LevelOfDetail::Detailed,
  ));
  assert!(!state.has_state_changed(&wanted_sector(&model, 1, LevelOfDetail::Detailed)));
  assert!(state.has_state_changed(&wanted_sector(&model, 1, LevelOfDetail::Simple)));
  assert!(state.has_state_changed(&wanted_sector(&model, 1, LevelOfDetail::Discarded)));
}

#[test]
fn update_state_is_idempotent() {
  let scene = build_test_scene(2, 2);
  let model = test_model(&scene);
  let mut state = ModelStateHandler::new();
  state.add_model(model.model_identifier);

  let consumed = consumed_sector(model.model_identifier, 2, LevelOfDetail::Simple);
  state.update_state(&consumed);
  state.update_state(&consumed);
  assert!(!state.has_state_changed(&wanted_sector(&model, 2, LevelOfDetail::Simple)));
}

#[test]
fn discarded_entries_are_removed_not_stored() {
  let scene = build_test_scene(2, 2);
  let model = test_model(&scene);
  let mut state = ModelStateHandler::new();
  state.add_model(model.model_identifier);

  state.update_state(&consumed_sector(
    model.model_identifier,
    0,
    LevelOfDetail::Detailed,
  ));
  state.update_state(&consumed_sector(
    model.model_identifier,
    0,
    LevelOfDetail::Discarded,
  ));

  // Back to the sparse default
  assert!(!state.has_state_changed(&wanted_sector(&model, 0, LevelOfDetail::Discarded)));
}

#[test]
fn update_after_model_removal_is_a_silent_noop() {
  let scene = build_test_scene(2, 2);
  let model = test_model(&scene);
  let mut state = ModelStateHandler::new();
  state.add_model(model.model_identifier);
  state.remove_model(model.model_identifier);

  // A fetch that settles after removal must not panic or resurrect state
  state.update_state(&consumed_sector(
    model.model_identifier,
    0,
    LevelOfDetail::Detailed,
  ));
  assert!(!state.has_model(model.model_identifier));
}

#[test]
#[should_panic(expected = "added twice")]
fn double_add_panics() {
  let mut state = ModelStateHandler::new();
  let model = ModelIdentifier::new();
  state.add_model(model);
  state.add_model(model);
}

#[test]
#[should_panic(expected = "never added")]
fn remove_unknown_model_panics() {
  let mut state = ModelStateHandler::new();
  state.remove_model(ModelIdentifier::new());
}
