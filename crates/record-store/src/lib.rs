//! Crate `record-store` — modelo de registros y contrato del servicio de datos
//!
//! Este crate define los tipos que viajan entre el motor de duplicación y el
//! almacén remoto (`Record`, `EntityReference`, `FieldValue`), el
//! constructor tipado de consultas (`Query`), el contrato `DataService` y
//! una implementación en memoria útil para pruebas (`InMemoryDataService`).
//!
//! Diseño resumido:
//! - Llamadas síncronas de petición/respuesta; cada una puede fallar con un
//!   `ServiceFault` que conserva el código numérico del proveedor.
//! - Las consultas son estructuras tipadas: los ids se pasan como valores,
//!   nunca se interpolan en texto.
//!
//! Ejemplo rápido:
//! ```rust
//! use record_store::{DataService, InMemoryDataService, Record, ColumnSet};
//! let svc = InMemoryDataService::new();
//! let id = svc.create(&Record::new("account").field("name", "Contoso")).unwrap();
//! let back = svc.fetch("account", id, &ColumnSet::All).unwrap();
//! assert_eq!(back.get_str("name"), Some("Contoso"));
//! ```
pub mod domain;
pub mod errors;
pub mod query;
pub mod repository;
pub mod stubs;

pub use domain::*;
pub use errors::*;
pub use query::*;
pub use repository::*;
pub use stubs::*;
