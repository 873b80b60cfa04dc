use crate::errors::{DuplicateError, Stage};
use crate::step::context::StepContext;
use record_store::EntityReference;
use serde::{Deserialize, Serialize};

/// Resultado tipado de un paso. El motor lo acumula en el reporte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
  RootCloned { clone: EntityReference },
  DependentsCloned { child_type: String, count: usize },
  /// `false` cuando el original no tenía registro de estado.
  WorkflowStateTransferred { transferred: bool },
  AssociationsReplicated { relationship: String, count: usize },
}

pub type StepResult = Result<StepOutcome, DuplicateError>;

/// Trait que representa un paso de la duplicación.
///
/// Los pasos se ejecutan en el orden de `Stage::PIPELINE`; dentro de una
/// misma etapa, en el orden en que se registraron.
pub trait DuplicationStep: Send + Sync {
  /// Nombre del paso para trazas.
  fn name(&self) -> &str;

  /// Etapa a la que pertenece el paso.
  fn stage(&self) -> Stage;

  /// Ejecuta el paso. Cualquier registro creado o modificado debe quedar
  /// anotado en el libro de `ctx` antes de devolver.
  fn execute(&self, ctx: &mut StepContext) -> StepResult;
}
