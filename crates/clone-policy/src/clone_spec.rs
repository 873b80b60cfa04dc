// clone_spec.rs
use crate::field_rule::{FieldRule, RuleAction, DEFAULT_RULES};
use record_store::{primary_id_attribute, FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Transformación que se aplica al clon ya filtrado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostTransform {
  /// Antepone `prefix` al valor de texto de `field`. Un valor ausente o
  /// nulo se trata como cadena vacía, así que el campo siempre queda
  /// establecido.
  PrefixField { field: String, prefix: String },
}

impl PostTransform {
  pub fn apply(&self, clone: &mut Record) {
    match self {
      PostTransform::PrefixField { field, prefix } => {
        let current = clone.get_str(field).unwrap_or_default();
        let value = format!("{}{}", prefix, current);
        clone.set(field.clone(), value);
      }
    }
  }
}

/// Política de clonado de un tipo de registro.
///
/// Orden de decisión por campo:
/// 1. `identity_fields` (más la clave primaria del tipo): siempre excluidos.
/// 2. `context_references`: lista explícita de referencias de contexto que
///    el clon debe conservar (cliente, propietario, moneda...). Se copian si
///    no son nulas.
/// 3. `rules`, en orden.
/// 4. `DEFAULT_RULES` (ids, auditoría, campos de sistema).
/// 5. Si nada coincide: se copia si no es nulo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneSpec {
  pub record_type: String,
  #[serde(default)]
  pub identity_fields: Vec<String>,
  #[serde(default)]
  pub context_references: Vec<String>,
  #[serde(default)]
  pub rules: Vec<FieldRule>,
  #[serde(default)]
  pub transform: Option<PostTransform>,
}

impl CloneSpec {
  pub fn new(record_type: impl Into<String>) -> Self {
    Self { record_type: record_type.into(),
           identity_fields: Vec::new(),
           context_references: Vec::new(),
           rules: Vec::new(),
           transform: None }
  }

  pub fn with_context_references<I, S>(mut self, names: I) -> Self
    where I: IntoIterator<Item = S>,
          S: Into<String>
  {
    self.context_references.extend(names.into_iter().map(Into::into));
    self
  }

  pub fn with_rule(mut self, rule: FieldRule) -> Self {
    self.rules.push(rule);
    self
  }

  pub fn with_identity_field(mut self, name: impl Into<String>) -> Self {
    self.identity_fields.push(name.into());
    self
  }

  pub fn with_transform(mut self, transform: PostTransform) -> Self {
    self.transform = Some(transform);
    self
  }

  fn is_identity(&self, field: &str) -> bool {
    field.eq_ignore_ascii_case(&primary_id_attribute(&self.record_type))
    || self.identity_fields.iter().any(|f| f.eq_ignore_ascii_case(field))
  }

  /// Decide la acción para un campo según el orden documentado en el tipo.
  pub fn decide(&self, field: &str) -> RuleAction {
    if self.is_identity(field) {
      return RuleAction::Exclude;
    }
    if self.context_references.iter().any(|f| f.eq_ignore_ascii_case(field)) {
      return RuleAction::IncludeIfNonNull;
    }
    self.rules
        .iter()
        .chain(DEFAULT_RULES.iter())
        .find(|r| r.pattern.matches(field))
        .map(|r| r.action)
        .unwrap_or(RuleAction::IncludeIfNonNull)
  }

  /// Construye el clon (sin guardar, sin id) a partir del original.
  ///
  /// Sólo contiene los campos copiados explícitamente más el resultado de
  /// la transformación. Un clon sin campos es válido.
  pub fn apply(&self, original: &Record) -> Record {
    let mut clone = Record::new(original.logical_name.clone());
    for (name, value) in original.fields.iter() {
      let keep = match self.decide(name) {
        RuleAction::Exclude => false,
        RuleAction::Include => true,
        RuleAction::IncludeIfNonNull => !matches!(value, FieldValue::Null),
      };
      if keep {
        clone.set(name.clone(), value.clone());
      }
    }
    if let Some(t) = &self.transform {
      t.apply(&mut clone);
    }
    clone
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use record_store::{EntityReference, RecordId};

  fn spec() -> CloneSpec {
    CloneSpec::new("opportunity").with_context_references(["customerid", "ownerid"])
                                 .with_transform(PostTransform::PrefixField { field: "name".into(),
                                                                              prefix: "[Cloned] ".into() })
  }

  #[test]
  fn allow_list_beats_identity_suffix() {
    let s = spec();
    assert_eq!(s.decide("customerid"), RuleAction::IncludeIfNonNull);
    assert_eq!(s.decide("campaignid"), RuleAction::Exclude);
    assert_eq!(s.decide("opportunityid"), RuleAction::Exclude);
  }

  #[test]
  fn explicit_rule_beats_default() {
    let s = spec().with_rule(FieldRule::include("processid"));
    assert_eq!(s.decide("processid"), RuleAction::Include);
  }

  #[test]
  fn identity_field_cannot_be_reincluded() {
    let s = spec().with_rule(FieldRule::include("opportunityid"));
    assert_eq!(s.decide("OpportunityId"), RuleAction::Exclude);
  }

  #[test]
  fn missing_name_becomes_bare_prefix() {
    let original = Record::new("opportunity").field("customerid",
                                                    EntityReference::new("account", RecordId::new_v4()));
    let clone = spec().apply(&original);
    assert_eq!(clone.get_str("name"), Some("[Cloned] "));
    assert!(clone.id.is_none());
  }
}
