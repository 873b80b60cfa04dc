// profile.rs
use crate::association_spec::AssociationSpec;
use crate::clone_spec::{CloneSpec, PostTransform};
use crate::dependent_spec::DependentSpec;
use crate::errors::PolicyError;
use crate::workflow_spec::WorkflowStateSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefijo con el que se marca el nombre de un duplicado.
pub const CLONED_PREFIX: &str = "[Cloned] ";

/// Perfil completo de duplicación de un tipo raíz: cómo clonar la raíz, qué
/// colecciones hijas replicar, qué estado de proceso transferir y qué
/// aristas N:N reconstruir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicationProfile {
  pub root: CloneSpec,
  #[serde(default)]
  pub dependents: Vec<DependentSpec>,
  #[serde(default)]
  pub workflow_state: Option<WorkflowStateSpec>,
  #[serde(default)]
  pub associations: Vec<AssociationSpec>,
}

fn require(value: &str, what: &str) -> Result<(), PolicyError> {
  if value.trim().is_empty() {
    return Err(PolicyError::ValidationError(format!("{} no puede estar vacío", what)));
  }
  Ok(())
}

impl DuplicationProfile {
  pub fn root_type(&self) -> &str {
    &self.root.record_type
  }

  /// Valida la coherencia del perfil (tipos y claves no vacíos, hijos que
  /// apuntan a la raíz).
  pub fn validate(&self) -> Result<(), PolicyError> {
    require(&self.root.record_type, "root.record_type")?;
    if let Some(PostTransform::PrefixField { field, .. }) = &self.root.transform {
      require(field, "root.transform.field")?;
    }
    for d in &self.dependents {
      require(&d.child_type, "dependents.child_type")?;
      require(&d.foreign_key_field, "dependents.foreign_key_field")?;
      if d.parent_type != self.root.record_type {
        return Err(PolicyError::ValidationError(format!("El hijo {} apunta a {} y no a la raíz {}",
                                                        d.child_type, d.parent_type, self.root.record_type)));
      }
    }
    if let Some(w) = &self.workflow_state {
      require(&w.state_type, "workflow_state.state_type")?;
      require(&w.link_field, "workflow_state.link_field")?;
      if w.transfer_fields.is_empty() {
        return Err(PolicyError::ValidationError("workflow_state.transfer_fields está vacío".into()));
      }
    }
    for a in &self.associations {
      require(&a.relationship_name, "associations.relationship_name")?;
      require(&a.related_type, "associations.related_type")?;
      require(&a.intersect_entity, "associations.intersect_entity")?;
      require(&a.related_key, "associations.related_key")?;
      require(&a.root_key, "associations.root_key")?;
    }
    Ok(())
  }

  /// Carga y valida un perfil desde JSON.
  pub fn from_json_str(s: &str) -> Result<Self, PolicyError> {
    let profile: DuplicationProfile = serde_json::from_str(s)?;
    profile.validate()?;
    Ok(profile)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_json_str(&raw)
  }

  pub fn to_json_pretty(&self) -> Result<String, PolicyError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Perfil de oportunidades: productos de la oportunidad, proceso de
  /// ventas y partes interesadas (relación N:N personalizada).
  pub fn opportunity() -> Self {
    let root = CloneSpec::new("opportunity").with_context_references(["customerid",
                                                                      "parentcontactid",
                                                                      "parentaccountid",
                                                                      "ownerid",
                                                                      "transactioncurrencyid",
                                                                      "pricelevelid"])
                                            .with_transform(PostTransform::PrefixField { field: "name".into(),
                                                                                         prefix: CLONED_PREFIX.into() });
    let products = DependentSpec { child_type: "opportunityproduct".into(),
                                   parent_type: "opportunity".into(),
                                   foreign_key_field: "opportunityid".into(),
                                   retained_references: vec!["uomid".into(), "productid".into()],
                                   identity_fields: vec![],
                                   blob_fields: vec!["entityimage".into(), "entityimage_timestamp".into()],
                                   computed_fields: vec!["baseamount".into(),
                                                         "extendedamount".into(),
                                                         "tax".into(),
                                                         "manualdiscountamount".into()],
                                   exclusions: vec![] };
    let stakeholders = AssociationSpec { relationship_name: "crff8_Stakeholder_Opportunity_Opportunity".into(),
                                         related_type: "crff8_stakeholder".into(),
                                         intersect_entity: "crff8_stakeholder_opportunity".into(),
                                         related_key: "crff8_stakeholderid".into(),
                                         root_key: "opportunityid".into() };
    DuplicationProfile { root,
                         dependents: vec![products],
                         workflow_state: Some(WorkflowStateSpec::new("opportunitysalesprocess", "opportunityid")),
                         associations: vec![stakeholders] }
  }
}
