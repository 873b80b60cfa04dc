// errors.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
  #[error("Error de E/S: {0}")]
  IoError(String),
}

impl From<serde_json::Error> for PolicyError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}

impl From<std::io::Error> for PolicyError {
  fn from(e: std::io::Error) -> Self {
    Self::IoError(e.to_string())
  }
}
