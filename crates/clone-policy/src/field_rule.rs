// field_rule.rs
//! Reglas declarativas por nombre de campo.
//!
//! Una `FieldRule` asocia un patrón (exacto, prefijo o sufijo, sin
//! distinguir mayúsculas) con una acción. Las reglas se evalúan en orden y
//! la primera que coincide decide.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldPattern {
  Exact(String),
  Prefix(String),
  Suffix(String),
}

impl FieldPattern {
  pub fn matches(&self, field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    match self {
      FieldPattern::Exact(p) => field == p.to_ascii_lowercase(),
      FieldPattern::Prefix(p) => field.starts_with(&p.to_ascii_lowercase()),
      FieldPattern::Suffix(p) => field.ends_with(&p.to_ascii_lowercase()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
  /// El campo nunca se copia.
  Exclude,
  /// El campo se copia siempre, incluso si es nulo (se envía nulo
  /// explícito).
  Include,
  /// El campo se copia sólo si tiene valor.
  IncludeIfNonNull,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
  pub pattern: FieldPattern,
  pub action: RuleAction,
}

impl FieldRule {
  pub fn exclude_exact(name: &str) -> Self {
    Self { pattern: FieldPattern::Exact(name.to_string()), action: RuleAction::Exclude }
  }

  pub fn exclude_prefix(prefix: &str) -> Self {
    Self { pattern: FieldPattern::Prefix(prefix.to_string()), action: RuleAction::Exclude }
  }

  pub fn exclude_suffix(suffix: &str) -> Self {
    Self { pattern: FieldPattern::Suffix(suffix.to_string()), action: RuleAction::Exclude }
  }

  pub fn include(name: &str) -> Self {
    Self { pattern: FieldPattern::Exact(name.to_string()), action: RuleAction::Include }
  }

  pub fn include_if_non_null(name: &str) -> Self {
    Self { pattern: FieldPattern::Exact(name.to_string()), action: RuleAction::IncludeIfNonNull }
  }
}

/// Prefijos de metadatos de auditoría (creado/modificado).
pub const AUDIT_PREFIXES: [&str; 2] = ["created", "modified"];

/// Sufijo que denota un id de identidad o clave foránea.
pub const IDENTITY_SUFFIX: &str = "id";

/// Campos de contabilidad del sistema: el clon nace con el estado inicial.
pub const SYSTEM_FIELDS: [&str; 3] = ["statecode", "statuscode", "versionnumber"];

/// Reglas por defecto que se aplican cuando ninguna regla específica del
/// tipo coincide. Si tampoco coinciden, el campo se copia si no es nulo.
pub static DEFAULT_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
  let mut rules = vec![FieldRule::exclude_suffix(IDENTITY_SUFFIX)];
  rules.extend(AUDIT_PREFIXES.iter().map(|p| FieldRule::exclude_prefix(p)));
  rules.extend(SYSTEM_FIELDS.iter().map(|f| FieldRule::exclude_exact(f)));
  rules
});

/// Indica si el nombre corresponde a metadatos de auditoría.
pub fn is_audit_field(field: &str) -> bool {
  let lower = field.to_ascii_lowercase();
  AUDIT_PREFIXES.iter().any(|p| lower.starts_with(p))
}
