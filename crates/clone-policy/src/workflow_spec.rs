// workflow_spec.rs
use record_store::{Condition, FieldValue, Query, Record, RecordId};
use serde::{Deserialize, Serialize};

/// Cómo localizar y parchear el registro de estado de proceso que el
/// servicio crea junto con un registro raíz ligado a un proceso.
///
/// Sólo se transfieren `transfer_fields` (identidad del proceso y camino
/// recorrido). La etapa activa y el estado/estatus del proceso no se
/// exponen como propiedades asignables y quedan fuera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStateSpec {
  pub state_type: String,
  pub link_field: String,
  #[serde(default = "default_transfer_fields")]
  pub transfer_fields: Vec<String>,
}

pub fn default_transfer_fields() -> Vec<String> {
  vec!["processid".to_string(), "traversedpath".to_string()]
}

impl WorkflowStateSpec {
  pub fn new(state_type: impl Into<String>, link_field: impl Into<String>) -> Self {
    Self { state_type: state_type.into(), link_field: link_field.into(), transfer_fields: default_transfer_fields() }
  }

  /// Consulta del (único) registro de estado ligado a `root_id`.
  pub fn state_query(&self, root_id: RecordId) -> Query {
    Query::new(self.state_type.clone()).filter(Condition::eq(self.link_field.clone(), root_id)).top(1)
  }

  /// Parche de actualización dirigido al registro de estado del clon.
  /// Lleva todos los `transfer_fields`; un campo ausente en el original se
  /// envía como nulo para que el clon no conserve el valor inicial.
  pub fn transfer_patch(&self, original_state: &Record, clone_state_id: RecordId) -> Record {
    let mut patch = Record::with_id(self.state_type.clone(), clone_state_id);
    for field in &self.transfer_fields {
      let value = original_state.get(field).cloned().unwrap_or(FieldValue::Null);
      patch.set(field.clone(), value);
    }
    patch
  }
}
