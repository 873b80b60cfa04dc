// Archivo: errors.rs
// Propósito: definir el fault que devuelve el servicio de datos y el alias
// Result<T> usado por las APIs del crate.
use thiserror::Error;

/// Códigos numéricos conocidos del proveedor.
///
/// Los valores corresponden a los códigos HRESULT que publica el servicio
/// remoto; sólo se listan los que el crate interpreta o produce.
pub struct FaultCode;

impl FaultCode {
    /// El registro solicitado no existe (0x80040217).
    pub const OBJECT_DOES_NOT_EXIST: i32 = -2147220969;
    /// Ya existe un registro con la misma clave (0x80040237).
    pub const DUPLICATE_RECORD: i32 = -2147220937;
    /// Argumento inválido en la petición (0x80040203).
    pub const INVALID_ARGUMENT: i32 = -2147220989;
    /// Fallo genérico del servidor (0x80040216).
    pub const UNEXPECTED: i32 = -2147220970;
}

/// Fault emitido por cualquier operación del `DataService`.
///
/// Transporta el código numérico del proveedor y su mensaje. Las capas
/// superiores deciden cómo traducirlo; aquí sólo se preserva.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Fault {code}: {message}")]
pub struct ServiceFault {
    /// Código numérico del proveedor.
    pub code: i32,
    /// Mensaje legible devuelto por el proveedor.
    pub message: String,
}

impl ServiceFault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Atajo para el fault de "registro no encontrado".
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FaultCode::OBJECT_DOES_NOT_EXIST, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FaultCode::INVALID_ARGUMENT, message)
    }

    /// Indica si el fault corresponde a un registro inexistente.
    pub fn is_not_found(&self) -> bool {
        self.code == FaultCode::OBJECT_DOES_NOT_EXIST
    }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, ServiceFault>;
