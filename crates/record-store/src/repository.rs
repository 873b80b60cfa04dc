// Archivo: repository.rs
// Propósito: definir el trait `DataService`, el contrato mínimo que el
// motor de duplicación exige al almacén remoto de registros.
use crate::domain::{EntityReference, Record, RecordId};
use crate::errors::Result;
use crate::query::{ColumnSet, Query};

/// Contrato mínimo del servicio de datos remoto.
///
/// Todas las llamadas son síncronas: se emiten y se esperan antes de la
/// siguiente. Cualquiera puede fallar con un `ServiceFault` que lleva el
/// código numérico del proveedor.
///
/// Postcondición relevante de `create`: si el tipo creado está ligado a un
/// proceso de negocio, el servicio crea en la misma llamada el registro de
/// estado del proceso, consultable de inmediato.
pub trait DataService: Send + Sync {
    /// Recupera un registro por tipo e id. Falla con
    /// `FaultCode::OBJECT_DOES_NOT_EXIST` si no existe.
    fn fetch(&self, logical_name: &str, id: RecordId, columns: &ColumnSet) -> Result<Record>;

    /// Ejecuta una consulta y devuelve los registros en orden estable
    /// (posiblemente vacío).
    fn query(&self, query: &Query) -> Result<Vec<Record>>;

    /// Crea un registro y devuelve el id asignado por el servicio.
    fn create(&self, record: &Record) -> Result<RecordId>;

    /// Actualiza un registro existente. `record.id` es obligatorio; los
    /// campos presentes se fusionan con los existentes.
    fn update(&self, record: &Record) -> Result<()>;

    /// Crea vínculos N:N entre `source` y cada uno de `targets` bajo la
    /// relación `relationship`.
    fn associate(&self, relationship: &str, source: &EntityReference, targets: &[EntityReference]) -> Result<()>;
}

impl<T: DataService + ?Sized> DataService for std::sync::Arc<T> {
    fn fetch(&self, logical_name: &str, id: RecordId, columns: &ColumnSet) -> Result<Record> {
        (**self).fetch(logical_name, id, columns)
    }

    fn query(&self, query: &Query) -> Result<Vec<Record>> {
        (**self).query(query)
    }

    fn create(&self, record: &Record) -> Result<RecordId> {
        (**self).create(record)
    }

    fn update(&self, record: &Record) -> Result<()> {
        (**self).update(record)
    }

    fn associate(&self, relationship: &str, source: &EntityReference, targets: &[EntityReference]) -> Result<()> {
        (**self).associate(relationship, source, targets)
    }
}
