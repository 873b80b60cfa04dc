// Archivo: domain.rs
// Propósito: tipos de datos que viajan entre el motor y el servicio de
// datos: `RecordId`, `EntityReference`, `FieldValue` y `Record`.
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identificador opaco de un registro. Lo asigna siempre el servicio de
/// datos al crear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Genera un id nuevo (v4). Sólo lo usan las implementaciones del
    /// servicio; el motor nunca inventa ids.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(RecordId)
    }
}

impl From<Uuid> for RecordId {
    fn from(u: Uuid) -> Self {
        RecordId(u)
    }
}

/// Puntero ligero a un registro: tipo lógico + id, sin valores de campos.
/// Se usa para claves foráneas y extremos de asociaciones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityReference {
    pub logical_name: String,
    pub id: RecordId,
}

impl EntityReference {
    pub fn new(logical_name: impl Into<String>, id: RecordId) -> Self {
        Self { logical_name: logical_name.into(), id }
    }
}

impl fmt::Display for EntityReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.logical_name, self.id)
    }
}

/// Valor de un campo. `Null` representa un atributo presente pero vacío;
/// un campo ausente simplemente no aparece en `Record::fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i64),
    Decimal(f64),
    Money(f64),
    Boolean(bool),
    OptionSet(i32),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Reference(EntityReference),
    Binary(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldValue::Reference(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, FieldValue::Binary(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&EntityReference> {
        match self {
            FieldValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Indica si el valor apunta al id dado, ya sea como guid plano o como
    /// referencia tipada. Es la semántica de igualdad que usan las
    /// condiciones de consulta sobre claves.
    pub fn refers_to(&self, id: &RecordId) -> bool {
        match self {
            FieldValue::Guid(g) => g == id.as_uuid(),
            FieldValue::Reference(r) => &r.id == id,
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<EntityReference> for FieldValue {
    fn from(r: EntityReference) -> Self {
        FieldValue::Reference(r)
    }
}

impl From<RecordId> for FieldValue {
    fn from(id: RecordId) -> Self {
        FieldValue::Guid(id.0)
    }
}

/// Nombre del atributo de clave primaria para un tipo lógico
/// (convención del proveedor: `<tipo>id`).
pub fn primary_id_attribute(logical_name: &str) -> String {
    format!("{}id", logical_name)
}

/// Bolsa de campos con nombre, etiquetada con su tipo lógico y, si ya
/// existe en el servicio, su id.
///
/// El orden de inserción de los campos se conserva para que las trazas y
/// las comparaciones en pruebas sean estables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub logical_name: String,
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Crea un registro vacío sin id (todavía no persistido).
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self { logical_name: logical_name.into(), id: None, fields: IndexMap::new() }
    }

    /// Crea un registro vacío dirigido a un id existente (para `update`).
    pub fn with_id(logical_name: impl Into<String>, id: RecordId) -> Self {
        Self { logical_name: logical_name.into(), id: Some(id), fields: IndexMap::new() }
    }

    /// Builder: añade un campo y devuelve el registro.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Elimina un campo conservando el orden del resto.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Referencia al registro si ya tiene id.
    pub fn to_reference(&self) -> Option<EntityReference> {
        self.id.map(|id| EntityReference::new(self.logical_name.clone(), id))
    }
}
