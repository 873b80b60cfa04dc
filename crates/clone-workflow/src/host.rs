//! Adaptador para el host que invoca la duplicación como acción.
//!
//! El host entrega un contexto con parámetros de entrada y espera el id del
//! clon en los parámetros de salida.
use crate::engine::DuplicationEngine;
use crate::errors::DuplicateError;
use record_store::EntityReference;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Parámetro de entrada con el registro a duplicar.
pub const TARGET_PARAMETER: &str = "Target";
/// Parámetro de salida con el id del clon.
pub const OUTPUT_PARAMETER: &str = "output";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
  EntityReference(EntityReference),
  String(String),
  Json(serde_json::Value),
}

impl ParameterValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      ParameterValue::String(s) => Some(s),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginExecutionContext {
  #[serde(default)]
  pub input_parameters: HashMap<String, ParameterValue>,
  #[serde(default)]
  pub output_parameters: HashMap<String, ParameterValue>,
}

impl PluginExecutionContext {
  pub fn with_target(target: EntityReference) -> Self {
    let mut ctx = Self::default();
    ctx.input_parameters.insert(TARGET_PARAMETER.to_string(), ParameterValue::EntityReference(target));
    ctx
  }

  /// Id del clon escrito por la última ejecución, si hubo.
  pub fn output(&self) -> Option<&str> {
    self.output_parameters.get(OUTPUT_PARAMETER).and_then(ParameterValue::as_str)
  }
}

/// Acción de duplicación expuesta al host.
pub struct DuplicatePlugin {
  engine: DuplicationEngine,
}

impl DuplicatePlugin {
  pub fn new(engine: DuplicationEngine) -> Self {
    Self { engine }
  }

  pub fn engine(&self) -> &DuplicationEngine {
    &self.engine
  }

  /// Ejecuta la acción. Sin `Target`, o con un `Target` que no es una
  /// referencia del tipo raíz, no hace nada y no escribe salida.
  pub fn execute(&self, ctx: &mut PluginExecutionContext) -> Result<(), DuplicateError> {
    let target = match ctx.input_parameters.get(TARGET_PARAMETER) {
      Some(ParameterValue::EntityReference(r)) => r.clone(),
      Some(_) => {
        debug!("el parámetro Target no es una referencia; nada que hacer");
        return Ok(());
      }
      None => {
        debug!("sin parámetro Target; nada que hacer");
        return Ok(());
      }
    };

    match self.engine.duplicate(&target) {
      Ok(Some(clone)) => {
        info!(clone = %clone, "duplicación terminada");
        ctx.output_parameters.insert(OUTPUT_PARAMETER.to_string(), ParameterValue::String(clone.id.to_string()));
        Ok(())
      }
      Ok(None) => Ok(()),
      Err(e) => {
        error!(record = %target, "{}", e);
        Err(e)
      }
    }
  }
}
