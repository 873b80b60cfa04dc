use crate::engine::state::DuplicationState;
use crate::step::{LedgerEntry, StepOutcome};
use chrono::{DateTime, Utc};
use record_store::EntityReference;
use serde::{Deserialize, Serialize};

/// Resumen de una duplicación completada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationReport {
  pub original: EntityReference,
  pub clone: EntityReference,
  /// Hijos creados por tipo, en el orden del perfil.
  pub dependents_cloned: Vec<(String, usize)>,
  pub state_transferred: bool,
  /// Aristas creadas por relación, en el orden del perfil.
  pub associations_replicated: Vec<(String, usize)>,
  pub transitions: Vec<DuplicationState>,
  pub ledger: Vec<LedgerEntry>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

impl DuplicationReport {
  pub fn total_dependents(&self) -> usize {
    self.dependents_cloned.iter().map(|(_, n)| n).sum()
  }

  pub fn total_associations(&self) -> usize {
    self.associations_replicated.iter().map(|(_, n)| n).sum()
  }
}

/// Acumulador interno mientras corre el pipeline.
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
  pub clone: Option<EntityReference>,
  pub dependents_cloned: Vec<(String, usize)>,
  pub state_transferred: bool,
  pub associations_replicated: Vec<(String, usize)>,
}

impl ReportBuilder {
  pub fn apply(&mut self, outcome: StepOutcome) {
    match outcome {
      StepOutcome::RootCloned { clone } => self.clone = Some(clone),
      StepOutcome::DependentsCloned { child_type, count } => self.dependents_cloned.push((child_type, count)),
      StepOutcome::WorkflowStateTransferred { transferred } => self.state_transferred |= transferred,
      StepOutcome::AssociationsReplicated { relationship, count } => {
        self.associations_replicated.push((relationship, count))
      }
    }
  }
}
