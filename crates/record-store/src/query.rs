// Archivo: query.rs
// Propósito: constructor tipado de consultas. Los ids viajan siempre como
// valores (`FieldValue`) dentro de `Condition`, nunca interpolados en un
// texto de consulta.
use crate::domain::{FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Columnas a devolver por `fetch`/`query`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnSet {
    /// Todas las columnas del registro.
    #[default]
    All,
    /// Sólo las columnas indicadas (las ausentes se omiten).
    Columns(Vec<String>),
}

impl ColumnSet {
    pub fn columns<I, S>(names: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        ColumnSet::Columns(names.into_iter().map(Into::into).collect())
    }

    /// Proyecta el registro a las columnas pedidas.
    pub fn project(&self, record: &Record) -> Record {
        match self {
            ColumnSet::All => record.clone(),
            ColumnSet::Columns(cols) => {
                let mut out = Record { logical_name: record.logical_name.clone(), id: record.id, ..Default::default() };
                for c in cols {
                    if let Some(v) = record.get(c) {
                        out.set(c.clone(), v.clone());
                    }
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    Null,
    NotNull,
}

/// Condición sobre un atributo del registro evaluado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: ConditionOperator,
    pub value: FieldValue,
}

impl Condition {
    /// `attribute = value`. Si `value` es un id (guid o referencia) la
    /// igualdad compara ids, de modo que una clave foránea tipada coincide
    /// con el guid plano del registro al que apunta.
    pub fn eq(attribute: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self { attribute: attribute.into(), operator: ConditionOperator::Equal, value: value.into() }
    }

    pub fn ne(attribute: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self { attribute: attribute.into(), operator: ConditionOperator::NotEqual, value: value.into() }
    }

    pub fn is_null(attribute: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), operator: ConditionOperator::Null, value: FieldValue::Null }
    }

    pub fn not_null(attribute: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), operator: ConditionOperator::NotNull, value: FieldValue::Null }
    }

    /// Evalúa la condición contra un registro.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.attribute);
        match self.operator {
            ConditionOperator::Null => actual.map_or(true, FieldValue::is_null),
            ConditionOperator::NotNull => actual.is_some_and(|v| !v.is_null()),
            ConditionOperator::Equal => actual.is_some_and(|v| values_equal(v, &self.value)),
            ConditionOperator::NotEqual => !actual.is_some_and(|v| values_equal(v, &self.value)),
        }
    }
}

fn values_equal(actual: &FieldValue, expected: &FieldValue) -> bool {
    match expected {
        FieldValue::Guid(g) => actual.refers_to(&(*g).into()),
        FieldValue::Reference(r) => actual.refers_to(&r.id),
        other => actual == other,
    }
}

/// Unión con otra entidad (típicamente la tabla intermedia de una relación
/// N:N). Un registro padre coincide si existe al menos un registro de
/// `name` cuyo atributo `from` apunta al atributo `to` del padre y que
/// cumple todas las `conditions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntity {
    pub name: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub intersect: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl LinkEntity {
    pub fn new(name: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { name: name.into(), from: from.into(), to: to.into(), intersect: false, conditions: Vec::new() }
    }

    pub fn intersect(mut self) -> Self {
        self.intersect = true;
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Consulta estructurada: entidad + condiciones (AND) + uniones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub entity: String,
    #[serde(default)]
    pub columns: ColumnSet,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub links: Vec<LinkEntity>,
    #[serde(default)]
    pub top: Option<usize>,
}

impl Query {
    pub fn new(entity: impl Into<String>) -> Self {
        Self { entity: entity.into(),
               columns: ColumnSet::All,
               conditions: Vec::new(),
               links: Vec::new(),
               top: None }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn link(mut self, link: LinkEntity) -> Self {
        self.links.push(link);
        self
    }

    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }

    pub fn columns(mut self, columns: ColumnSet) -> Self {
        self.columns = columns;
        self
    }

    /// Evalúa sólo las condiciones directas (sin uniones).
    pub fn matches_conditions(&self, record: &Record) -> bool {
        record.logical_name == self.entity && self.conditions.iter().all(|c| c.matches(record))
    }
}
