// association_spec.rs
use record_store::{Condition, LinkEntity, Query, RecordId};
use serde::{Deserialize, Serialize};

/// Un tipo de arista N:N a replicar desde el original hacia el clon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationSpec {
  /// Nombre de la relación usado en `associate`.
  pub relationship_name: String,
  /// Tipo de los registros relacionados.
  pub related_type: String,
  /// Tabla intermedia de la relación.
  pub intersect_entity: String,
  /// Clave del registro relacionado (en su tabla y en la intermedia).
  pub related_key: String,
  /// Clave de la raíz en la tabla intermedia.
  pub root_key: String,
}

impl AssociationSpec {
  /// Registros relacionados con `root_id` a través de la tabla intermedia.
  pub fn link_query(&self, root_id: RecordId) -> Query {
    let link = LinkEntity::new(self.intersect_entity.clone(), self.related_key.clone(), self.related_key.clone())
      .intersect()
      .filter(Condition::eq(self.root_key.clone(), root_id));
    Query::new(self.related_type.clone()).link(link)
  }
}
