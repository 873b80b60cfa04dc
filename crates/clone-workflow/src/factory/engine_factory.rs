use crate::config::{ConfigError, EngineConfig};
use crate::engine::DuplicationEngine;
use crate::host::DuplicatePlugin;
use clone_policy::DuplicationProfile;
use record_store::DataService;
use std::sync::Arc;

/// Fábrica de motores y del adaptador de host.
///
/// El servicio de datos siempre lo aporta quien llama; la fábrica sólo
/// decide qué perfil usar.
pub struct EngineFactory;

impl EngineFactory {
  /// Motor con el perfil indicado por el entorno (o el incorporado).
  pub fn from_env(service: Arc<dyn DataService>) -> Result<DuplicationEngine, ConfigError> {
    Self::from_config(service, EngineConfig::from_env()?)
  }

  pub fn from_config(service: Arc<dyn DataService>, config: EngineConfig) -> Result<DuplicationEngine, ConfigError> {
    Ok(DuplicationEngine::new(service, config.profile)?)
  }

  /// Motor de oportunidades con el perfil incorporado.
  pub fn opportunity(service: Arc<dyn DataService>) -> Result<DuplicationEngine, ConfigError> {
    Ok(DuplicationEngine::new(service, DuplicationProfile::opportunity())?)
  }

  pub fn plugin(service: Arc<dyn DataService>, config: EngineConfig) -> Result<DuplicatePlugin, ConfigError> {
    Ok(DuplicatePlugin::new(Self::from_config(service, config)?))
  }
}
