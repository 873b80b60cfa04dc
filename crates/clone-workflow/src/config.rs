use clone_policy::{DuplicationProfile, PolicyError};
use std::path::PathBuf;
use thiserror::Error;

/// Variable con la ruta de un perfil JSON. Sin ella se usa el perfil de
/// oportunidades incorporado.
pub const PROFILE_PATH_VAR: &str = "DUPLICATE_PROFILE_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("No se pudo cargar el perfil {path}: {source}")]
  Profile {
    path: PathBuf,
    #[source]
    source: PolicyError,
  },

  #[error("Error construyendo el motor: {0}")]
  Engine(#[from] crate::errors::DuplicateError),
}

/// Configuración del motor de duplicación.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
  pub profile: DuplicationProfile,
  /// Origen del perfil; `None` para el perfil incorporado.
  pub profile_path: Option<PathBuf>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { profile: DuplicationProfile::opportunity(), profile_path: None }
  }
}

impl EngineConfig {
  /// Carga `.env` si existe y lee la configuración del entorno.
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Igual que `from_env` pero con una función de búsqueda arbitraria.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String>
  {
    match lookup(PROFILE_PATH_VAR).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
      Some(raw) => Self::from_profile_file(PathBuf::from(raw)),
      None => Ok(Self::default()),
    }
  }

  pub fn from_profile_file(path: PathBuf) -> Result<Self, ConfigError> {
    let profile =
      DuplicationProfile::from_json_file(&path).map_err(|source| ConfigError::Profile { path: path.clone(), source })?;
    Ok(Self { profile, profile_path: Some(path) })
  }
}
