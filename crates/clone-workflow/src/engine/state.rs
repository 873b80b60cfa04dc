use crate::errors::{InvariantError, Stage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado de una duplicación. Sólo avanza hacia delante; `Failed` y `Done`
/// son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum DuplicationState {
  Start,
  RootCloned,
  DependentsCloned,
  StateTransferred,
  AssociationsReplicated,
  Done,
  Failed(Stage),
}

impl DuplicationState {
  /// Avanza tras completar `stage`. Cualquier otro orden es un error.
  pub fn complete(self, stage: Stage) -> Result<Self, InvariantError> {
    use DuplicationState::*;
    match (self, stage) {
      (Start, Stage::CloneRoot) => Ok(RootCloned),
      (RootCloned, Stage::CloneDependents) => Ok(DependentsCloned),
      (DependentsCloned, Stage::TransferWorkflowState) => Ok(StateTransferred),
      (StateTransferred, Stage::ReplicateAssociations) => Ok(AssociationsReplicated),
      (from, stage) => Err(InvariantError::InvalidTransition { from: from.to_string(), stage }),
    }
  }

  pub fn finish(self) -> Result<Self, InvariantError> {
    match self {
      DuplicationState::AssociationsReplicated => Ok(DuplicationState::Done),
      from => Err(InvariantError::InvalidTransition { from: from.to_string(), stage: Stage::ReplicateAssociations }),
    }
  }

  pub fn fail(self, stage: Stage) -> Self {
    match self {
      DuplicationState::Failed(s) => DuplicationState::Failed(s),
      _ => DuplicationState::Failed(stage),
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, DuplicationState::Done | DuplicationState::Failed(_))
  }
}

impl fmt::Display for DuplicationState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DuplicationState::Start => write!(f, "start"),
      DuplicationState::RootCloned => write!(f, "root-cloned"),
      DuplicationState::DependentsCloned => write!(f, "dependents-cloned"),
      DuplicationState::StateTransferred => write!(f, "state-transferred"),
      DuplicationState::AssociationsReplicated => write!(f, "associations-replicated"),
      DuplicationState::Done => write!(f, "done"),
      DuplicationState::Failed(stage) => write!(f, "failed({})", stage),
    }
  }
}
