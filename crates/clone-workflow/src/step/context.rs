use crate::errors::{DuplicateError, InvariantError, Stage};
use record_store::{DataService, EntityReference, Record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Escritura efectuada contra el servicio durante una duplicación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LedgerEntry {
  Created { record: EntityReference },
  Updated { record: EntityReference },
  Associated { relationship: String, source: EntityReference, target: EntityReference },
}

/// Contexto compartido por los pasos de una duplicación.
///
/// Guarda la imagen completa del original, la referencia del clon una vez
/// creado y el libro de escrituras. No hay compensación: si un paso falla,
/// el libro es la única constancia de lo que quedó creado.
pub struct StepContext {
  /// Servicio de datos sobre el que se ejecutan los pasos.
  pub service: Arc<dyn DataService>,
  /// Imagen completa del registro raíz original.
  pub original: Record,
  pub original_ref: EntityReference,
  clone: Option<EntityReference>,
  ledger: Vec<LedgerEntry>,
}

impl StepContext {
  pub fn new(service: Arc<dyn DataService>, original: Record, original_ref: EntityReference) -> Self {
    Self { service, original, original_ref, clone: None, ledger: Vec::new() }
  }

  /// Referencia del clon raíz; falla si todavía no se creó.
  pub fn clone_ref(&self, stage: Stage) -> Result<&EntityReference, DuplicateError> {
    self.clone.as_ref().ok_or_else(|| InvariantError::CloneNotCreated(stage).into())
  }

  pub fn clone_created(&self) -> Option<&EntityReference> {
    self.clone.as_ref()
  }

  pub(crate) fn set_clone(&mut self, clone: EntityReference) {
    self.clone = Some(clone);
  }

  pub fn record(&mut self, entry: LedgerEntry) {
    self.ledger.push(entry);
  }

  pub fn ledger(&self) -> &[LedgerEntry] {
    &self.ledger
  }

  /// Registros creados, en orden de creación.
  pub fn created(&self) -> Vec<&EntityReference> {
    self.ledger
        .iter()
        .filter_map(|e| match e {
          LedgerEntry::Created { record } => Some(record),
          _ => None,
        })
        .collect()
  }
}
