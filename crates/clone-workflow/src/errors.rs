use clone_policy::PolicyError;
use record_store::{EntityReference, RecordId, ServiceFault};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Etapas del pipeline de duplicación, en orden de ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  FetchRoot,
  CloneRoot,
  CloneDependents,
  TransferWorkflowState,
  ReplicateAssociations,
}

impl Stage {
  /// Etapas que ejecutan pasos, sin contar la lectura inicial de la raíz.
  pub const PIPELINE: [Stage; 4] =
    [Stage::CloneRoot, Stage::CloneDependents, Stage::TransferWorkflowState, Stage::ReplicateAssociations];
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Stage::FetchRoot => "fetch-root",
      Stage::CloneRoot => "clone-root",
      Stage::CloneDependents => "clone-dependents",
      Stage::TransferWorkflowState => "transfer-workflow-state",
      Stage::ReplicateAssociations => "replicate-associations",
    };
    write!(f, "{}", s)
  }
}

/// Violaciones de invariantes internas: no vienen de un fault del servicio
/// sino de un estado que el motor no sabe manejar.
#[derive(Error, Debug)]
pub enum InvariantError {
  #[error("El servicio devolvió para el clon el id del original: {0}")]
  CloneIdentityReused(RecordId),

  #[error("El clon {clone} no tiene registro de estado {state_type}")]
  MissingCloneWorkflowState { clone: EntityReference, state_type: String },

  #[error("Registro sin id devuelto por una consulta de {0}")]
  RecordWithoutId(String),

  #[error("La etapa {0} se ejecutó antes de existir el clon raíz")]
  CloneNotCreated(Stage),

  #[error("Transición inválida: {from} no admite completar {stage}")]
  InvalidTransition { from: String, stage: Stage },

  #[error("Perfil inválido: {0}")]
  Profile(#[from] PolicyError),
}

/// Error de una duplicación. El motor se detiene en el primer fallo y
/// devuelve una de estas tres clases.
#[derive(Error, Debug)]
pub enum DuplicateError {
  /// El registro de origen no existe (probablemente eliminado).
  #[error("No se encontró el registro de origen {reference}; puede haber sido eliminado o no tiene permisos para leerlo")]
  NotFound {
    reference: EntityReference,
    #[source]
    fault: ServiceFault,
  },

  /// Cualquier otro fault del servicio. El fault original queda como causa.
  #[error("Se produjo un error del servicio durante la duplicación ({stage})")]
  Service {
    stage: Stage,
    #[source]
    fault: ServiceFault,
  },

  #[error(transparent)]
  Unexpected(#[from] InvariantError),
}

impl DuplicateError {
  /// Adaptador para `map_err` que etiqueta un fault con su etapa.
  pub fn at(stage: Stage) -> impl FnOnce(ServiceFault) -> DuplicateError {
    move |fault| DuplicateError::Service { stage, fault }
  }

  /// Clasifica el fault de la lectura de la raíz: sólo aquí un "no existe"
  /// se convierte en `NotFound`.
  pub fn from_fetch(reference: &EntityReference, fault: ServiceFault) -> DuplicateError {
    if fault.is_not_found() {
      DuplicateError::NotFound { reference: reference.clone(), fault }
    } else {
      DuplicateError::Service { stage: Stage::FetchRoot, fault }
    }
  }

  pub fn stage(&self) -> Option<Stage> {
    match self {
      DuplicateError::NotFound { .. } => Some(Stage::FetchRoot),
      DuplicateError::Service { stage, .. } => Some(*stage),
      DuplicateError::Unexpected(InvariantError::CloneNotCreated(stage)) => Some(*stage),
      DuplicateError::Unexpected(_) => None,
    }
  }

  pub fn fault(&self) -> Option<&ServiceFault> {
    match self {
      DuplicateError::NotFound { fault, .. } | DuplicateError::Service { fault, .. } => Some(fault),
      DuplicateError::Unexpected(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::error::Error;

  #[test]
  fn fetch_not_found_maps_to_dedicated_variant() {
    let r = EntityReference::new("opportunity", RecordId::new_v4());
    let err = DuplicateError::from_fetch(&r, ServiceFault::not_found("gone"));
    assert!(matches!(err, DuplicateError::NotFound { .. }));
    assert!(err.to_string().contains("No se encontró"));
    assert!(err.source().is_some());
  }

  #[test]
  fn other_faults_keep_the_inner_fault() {
    let r = EntityReference::new("opportunity", RecordId::new_v4());
    let err = DuplicateError::from_fetch(&r, ServiceFault::invalid_argument("bad"));
    assert_eq!(err.stage(), Some(Stage::FetchRoot));
    assert_eq!(err.fault().map(|f| f.message.as_str()), Some("bad"));
    assert!(!err.to_string().contains("No se encontró"));
  }
}
