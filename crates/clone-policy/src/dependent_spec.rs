// dependent_spec.rs
use crate::field_rule::{is_audit_field, IDENTITY_SUFFIX};
use record_store::{primary_id_attribute, Condition, EntityReference, FieldValue, Query, Record, RecordId};
use serde::{Deserialize, Serialize};

/// Describe una colección de registros hijos que se replica bajo el clon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentSpec {
  /// Tipo lógico de los hijos (p. ej. `opportunityproduct`).
  pub child_type: String,
  /// Tipo lógico del padre al que apunta la clave foránea.
  pub parent_type: String,
  /// Campo del hijo que referencia al padre.
  pub foreign_key_field: String,
  /// Referencias a datos compartidos que se conservan aunque terminen en
  /// `id` (unidad de medida, producto del catálogo...).
  #[serde(default)]
  pub retained_references: Vec<String>,
  /// Identidad del hijo además de su clave primaria.
  #[serde(default)]
  pub identity_fields: Vec<String>,
  /// Campos de imagen/blob que no se copian.
  #[serde(default)]
  pub blob_fields: Vec<String>,
  /// Campos que el servidor recalcula a partir de otros (totales,
  /// impuestos, descuentos) y que nunca se copian desactualizados.
  #[serde(default)]
  pub computed_fields: Vec<String>,
  /// Exclusiones adicionales por registro.
  #[serde(default)]
  pub exclusions: Vec<String>,
}

fn listed(list: &[String], field: &str) -> bool {
  list.iter().any(|f| f.eq_ignore_ascii_case(field))
}

impl DependentSpec {
  /// Filtro de consulta: todos los hijos cuyo campo de clave foránea apunta
  /// a `root_id`.
  pub fn query_filter(&self, root_id: RecordId) -> Query {
    Query::new(self.child_type.clone()).filter(Condition::eq(self.foreign_key_field.clone(), root_id))
  }

  /// Indica si un campo del hijo original debe copiarse.
  pub fn keeps(&self, field: &str, value: &FieldValue) -> bool {
    if field.eq_ignore_ascii_case(&self.foreign_key_field) {
      return false;
    }
    let retained = listed(&self.retained_references, field);
    let identity_like = value.is_reference() || field.to_ascii_lowercase().ends_with(IDENTITY_SUFFIX);
    if identity_like && !retained {
      return false;
    }
    if field.eq_ignore_ascii_case(&primary_id_attribute(&self.child_type))
       || listed(&self.identity_fields, field)
       || is_audit_field(field)
    {
      return false;
    }
    if value.is_binary() || listed(&self.blob_fields, field) {
      return false;
    }
    !(listed(&self.computed_fields, field) || listed(&self.exclusions, field))
  }

  /// Construye el hijo clonado con la clave foránea reenlazada al clon.
  pub fn clone_child(&self, original: &Record, clone_root: &EntityReference) -> Record {
    let mut child = Record::new(self.child_type.clone());
    for (name, value) in original.fields.iter() {
      if self.keeps(name, value) {
        child.set(name.clone(), value.clone());
      }
    }
    child.set(self.foreign_key_field.clone(), clone_root.clone());
    child
  }
}
