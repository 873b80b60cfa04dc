// Archivo: stubs.rs
// Propósito: implementación en memoria de `DataService` para pruebas y
// para la CLI de demostración.
//
// Incluye relaciones N:N con tabla intermedia, registros de estado de
// proceso creados implícitamente, recálculo de importes de línea,
// inyección de faults y un diario de llamadas. No es durable.
use crate::domain::{primary_id_attribute, EntityReference, FieldValue, Record, RecordId};
use crate::errors::{FaultCode, Result, ServiceFault};
use crate::query::{ColumnSet, LinkEntity, Query};
use crate::repository::DataService;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Extremo de una relación N:N: tipo lógico + atributo que guarda su id en
/// la tabla intermedia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEnd {
    pub logical_name: String,
    pub key_attribute: String,
}

/// Definición de una relación N:N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    pub intersect_entity: String,
    pub entity1: RelationshipEnd,
    pub entity2: RelationshipEnd,
}

impl RelationshipDef {
    /// Devuelve (clave del origen, clave del destino, tipo destino) según
    /// el tipo del registro origen.
    fn orient(&self, source_type: &str) -> Option<(&str, &str, &str)> {
        if self.entity1.logical_name == source_type {
            Some((&self.entity1.key_attribute, &self.entity2.key_attribute, &self.entity2.logical_name))
        } else if self.entity2.logical_name == source_type {
            Some((&self.entity2.key_attribute, &self.entity1.key_attribute, &self.entity1.logical_name))
        } else {
            None
        }
    }
}

/// Liga un tipo raíz a un proceso de negocio: al crear un registro de
/// `root_type` se crea también su registro de estado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessBinding {
    pub root_type: String,
    pub state_type: String,
    pub link_field: String,
    pub process_id: RecordId,
    pub initial_stage_id: RecordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Fetch,
    Query,
    Create,
    Update,
    Associate,
}

/// Regla de inyección de faults: la llamada número `nth` (base 1) a
/// `operation` sobre `logical_name` (o sobre cualquier tipo si es `None`)
/// falla con `code`/`message`. Cada regla dispara una sola vez.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultRule {
    pub operation: Operation,
    pub logical_name: Option<String>,
    pub nth: usize,
    pub code: i32,
    pub message: String,
}

impl FaultRule {
    pub fn new(operation: Operation, logical_name: Option<&str>, nth: usize) -> Self {
        Self { operation,
               logical_name: logical_name.map(str::to_string),
               nth,
               code: FaultCode::UNEXPECTED,
               message: format!("injected fault on {:?} #{}", operation, nth) }
    }

    pub fn with_code(mut self, code: i32, message: impl Into<String>) -> Self {
        self.code = code;
        self.message = message.into();
        self
    }
}

/// Entrada del diario: cada llamada recibida por el servicio (incluidas
/// las que fallaron por una regla inyectada).
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub operation: Operation,
    pub logical_name: String,
    pub id: Option<RecordId>,
    /// Registro enviado en `create`/`update`, tal como lo envió el llamador.
    pub payload: Option<Record>,
    pub failed: bool,
}

/// Contenido inicial del almacén (formato JSON de la CLI).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSeed {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
    #[serde(default)]
    pub process_bindings: Vec<ProcessBinding>,
    #[serde(default)]
    pub recalculated_types: Vec<String>,
    /// Vínculos N:N iniciales: (relación, origen, destino).
    #[serde(default)]
    pub links: Vec<(String, EntityReference, EntityReference)>,
}

struct ArmedFault {
    rule: FaultRule,
    seen: usize,
    fired: bool,
}

#[derive(Default)]
struct StoreState {
    records: IndexMap<String, IndexMap<RecordId, Record>>,
    relationships: HashMap<String, RelationshipDef>,
    bindings: HashMap<String, ProcessBinding>,
    recalculated: HashSet<String>,
    faults: Vec<ArmedFault>,
    journal: Vec<JournalEntry>,
}

impl StoreState {
    fn get(&self, logical_name: &str, id: &RecordId) -> Option<&Record> {
        self.records.get(logical_name).and_then(|m| m.get(id))
    }

    fn exists(&self, r: &EntityReference) -> bool {
        self.get(&r.logical_name, &r.id).is_some()
    }

    /// Devuelve el fault si alguna regla armada coincide con esta llamada.
    fn trip(&mut self, operation: Operation, logical_name: &str) -> Option<ServiceFault> {
        let mut tripped = None;
        for armed in self.faults.iter_mut() {
            if armed.fired || armed.rule.operation != operation {
                continue;
            }
            if armed.rule.logical_name.as_deref().is_some_and(|t| t != logical_name) {
                continue;
            }
            armed.seen += 1;
            if armed.seen == armed.rule.nth && tripped.is_none() {
                armed.fired = true;
                tripped = Some(ServiceFault::new(armed.rule.code, armed.rule.message.clone()));
            }
        }
        tripped
    }

    fn record(&mut self, operation: Operation, logical_name: &str, id: Option<RecordId>, payload: Option<Record>) -> Result<()> {
        let fault = self.trip(operation, logical_name);
        self.journal.push(JournalEntry { operation,
                                         logical_name: logical_name.to_string(),
                                         id,
                                         payload,
                                         failed: fault.is_some() });
        match fault {
            Some(f) => Err(f),
            None => Ok(()),
        }
    }

    fn insert(&mut self, mut record: Record) -> Result<RecordId> {
        let id = record.id.unwrap_or_else(RecordId::new_v4);
        if self.get(&record.logical_name, &id).is_some() {
            return Err(ServiceFault::new(FaultCode::DUPLICATE_RECORD,
                                         format!("Cannot insert duplicate key: {} {}", record.logical_name, id)));
        }
        record.id = Some(id);
        record.set(primary_id_attribute(&record.logical_name), id);
        self.records.entry(record.logical_name.clone()).or_default().insert(id, record);
        Ok(id)
    }

    fn link_matches(&self, parent: &Record, link: &LinkEntity) -> bool {
        let parent_value = match parent.get(&link.to) {
            Some(v) => v,
            None => return false,
        };
        let linked = match self.records.get(&link.name) {
            Some(m) => m,
            None => return false,
        };
        linked.values().any(|candidate| {
                           let joined = match (parent_value, candidate.get(&link.from)) {
                               (FieldValue::Guid(g), Some(v)) => v.refers_to(&(*g).into()),
                               (FieldValue::Reference(r), Some(v)) => v.refers_to(&r.id),
                               (pv, Some(v)) => pv == v,
                               (_, None) => false,
                           };
                           joined && link.conditions.iter().all(|c| c.matches(candidate))
                       })
    }
}

fn numeric(v: Option<&FieldValue>) -> f64 {
    match v {
        Some(FieldValue::Money(m)) | Some(FieldValue::Decimal(m)) => *m,
        Some(FieldValue::Integer(i)) => *i as f64,
        _ => 0.0,
    }
}

/// Recalcula los importes de una línea a partir de cantidad y precio, como
/// hace el servidor real.
fn recalculate_line(record: &mut Record) {
    let base = numeric(record.get("priceperunit")) * numeric(record.get("quantity"));
    let extended = base - numeric(record.get("manualdiscountamount")) + numeric(record.get("tax"));
    record.set("baseamount", FieldValue::Money(base));
    record.set("extendedamount", FieldValue::Money(extended));
}

/// Servicio de datos en memoria (no durable).
pub struct InMemoryDataService {
    state: Mutex<StoreState>,
}

impl InMemoryDataService {
    /// Crea un almacén vacío.
    pub fn new() -> Self {
        Self { state: Mutex::new(StoreState::default()) }
    }

    /// Crea un almacén a partir de un `StoreSeed`.
    pub fn from_seed(seed: StoreSeed) -> Result<Self> {
        let svc = Self::new();
        for rel in seed.relationships {
            svc.register_relationship(rel);
        }
        for binding in seed.process_bindings {
            svc.bind_process(binding);
        }
        for t in seed.recalculated_types {
            svc.recalculate_totals_for(&t);
        }
        for r in seed.records {
            svc.seed(r)?;
        }
        for (rel, a, b) in seed.links {
            svc.seed_link(&rel, &a, &b)?;
        }
        Ok(svc)
    }

    /// Crea un almacén a partir de un `StoreSeed` en JSON. Un JSON inválido
    /// se informa como argumento inválido.
    pub fn from_seed_json(raw: &str) -> Result<Self> {
        let seed: StoreSeed = serde_json::from_str(raw)
            .map_err(|e| ServiceFault::invalid_argument(format!("invalid store seed: {}", e)))?;
        Self::from_seed(seed)
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con un fault
    /// genérico.
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|e| ServiceFault::new(FaultCode::UNEXPECTED, format!("mutex poisoned: {:?}", e)))
    }

    fn lock_or_recover(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_relationship(&self, rel: RelationshipDef) {
        self.lock_or_recover().relationships.insert(rel.name.clone(), rel);
    }

    pub fn bind_process(&self, binding: ProcessBinding) {
        self.lock_or_recover().bindings.insert(binding.root_type.clone(), binding);
    }

    /// Marca un tipo cuyos importes de línea recalcula el servidor al crear
    /// o actualizar.
    pub fn recalculate_totals_for(&self, logical_name: &str) {
        self.lock_or_recover().recalculated.insert(logical_name.to_string());
    }

    pub fn inject_fault(&self, rule: FaultRule) {
        self.lock_or_recover().faults.push(ArmedFault { rule, seen: 0, fired: false });
    }

    /// Inserta un registro tal cual, sin pasar por el diario ni por los
    /// efectos laterales de `create`. Para preparar datos de prueba.
    pub fn seed(&self, record: Record) -> Result<RecordId> {
        self.lock()?.insert(record)
    }

    /// Inserta un vínculo N:N sin pasar por el diario.
    pub fn seed_link(&self, relationship: &str, source: &EntityReference, target: &EntityReference) -> Result<()> {
        let mut st = self.lock()?;
        link_pair(&mut st, relationship, source, target)
    }

    pub fn get(&self, logical_name: &str, id: RecordId) -> Option<Record> {
        self.lock_or_recover().get(logical_name, &id).cloned()
    }

    /// Todos los registros de un tipo en orden de inserción.
    pub fn records_of(&self, logical_name: &str) -> Vec<Record> {
        self.lock_or_recover()
            .records
            .get(logical_name)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, logical_name: &str) -> usize {
        self.lock_or_recover().records.get(logical_name).map_or(0, |m| m.len())
    }

    /// Ids vinculados a `source` mediante la relación indicada.
    pub fn associated_ids(&self, relationship: &str, source: &EntityReference) -> Vec<RecordId> {
        let st = self.lock_or_recover();
        let def = match st.relationships.get(relationship) {
            Some(d) => d,
            None => return Vec::new(),
        };
        let (source_key, target_key, _) = match def.orient(&source.logical_name) {
            Some(o) => o,
            None => return Vec::new(),
        };
        st.records
          .get(&def.intersect_entity)
          .map(|rows| {
              rows.values()
                  .filter(|row| row.get(source_key).is_some_and(|v| v.refers_to(&source.id)))
                  .filter_map(|row| match row.get(target_key) {
                      Some(FieldValue::Guid(g)) => Some(RecordId(*g)),
                      Some(FieldValue::Reference(r)) => Some(r.id),
                      _ => None,
                  })
                  .collect()
          })
          .unwrap_or_default()
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock_or_recover().journal.clone()
    }

    /// Entradas del diario para una operación concreta.
    pub fn calls(&self, operation: Operation) -> Vec<JournalEntry> {
        self.lock_or_recover().journal.iter().filter(|e| e.operation == operation).cloned().collect()
    }

    pub fn clear_journal(&self) {
        self.lock_or_recover().journal.clear();
    }
}

impl Default for InMemoryDataService {
    fn default() -> Self {
        Self::new()
    }
}

fn link_pair(st: &mut StoreState, relationship: &str, source: &EntityReference, target: &EntityReference) -> Result<()> {
    let def = st.relationships
                .get(relationship)
                .cloned()
                .ok_or_else(|| ServiceFault::invalid_argument(format!("relationship {} not found", relationship)))?;
    let (source_key, target_key, target_type) = def.orient(&source.logical_name).ok_or_else(|| {
                                                   ServiceFault::invalid_argument(format!("{} is not part of relationship {}",
                                                                                          source.logical_name, relationship))
                                               })?;
    if target.logical_name != target_type {
        return Err(ServiceFault::invalid_argument(format!("{} is not part of relationship {}",
                                                          target.logical_name, relationship)));
    }
    for r in [source, target] {
        if !st.exists(r) {
            return Err(ServiceFault::not_found(format!("{} With Id = {} Does Not Exist", r.logical_name, r.id)));
        }
    }
    let duplicate = st.records.get(&def.intersect_entity).is_some_and(|rows| {
                                                              rows.values().any(|row| {
                                                                               row.get(source_key).is_some_and(|v| v.refers_to(&source.id))
                                                                               && row.get(target_key).is_some_and(|v| v.refers_to(&target.id))
                                                                           })
                                                          });
    if duplicate {
        return Err(ServiceFault::new(FaultCode::DUPLICATE_RECORD,
                                     format!("Cannot insert duplicate key in {}", def.intersect_entity)));
    }
    let row = Record::new(def.intersect_entity.clone()).field(source_key, source.id)
                                                       .field(target_key, target.id);
    st.insert(row)?;
    Ok(())
}

impl DataService for InMemoryDataService {
    /// Recupera un registro proyectado a `columns`. Retorna el fault
    /// `OBJECT_DOES_NOT_EXIST` si no existe.
    fn fetch(&self, logical_name: &str, id: RecordId, columns: &ColumnSet) -> Result<Record> {
        let mut st = self.lock()?;
        st.record(Operation::Fetch, logical_name, Some(id), None)?;
        st.get(logical_name, &id)
          .map(|r| columns.project(r))
          .ok_or_else(|| ServiceFault::not_found(format!("{} With Id = {} Does Not Exist", logical_name, id)))
    }

    /// Evalúa condiciones y uniones sobre los registros del tipo pedido,
    /// en orden de inserción, respetando `top`.
    fn query(&self, query: &Query) -> Result<Vec<Record>> {
        let mut st = self.lock()?;
        st.record(Operation::Query, &query.entity, None, None)?;
        let rows = match st.records.get(&query.entity) {
            Some(m) => m,
            None => return Ok(Vec::new()),
        };
        let limit = query.top.unwrap_or(usize::MAX);
        let out: Vec<Record> = rows.values()
                                   .filter(|r| query.matches_conditions(r))
                                   .filter(|r| query.links.iter().all(|l| st.link_matches(r, l)))
                                   .take(limit)
                                   .map(|r| query.columns.project(r))
                                   .collect();
        debug!(entity = %query.entity, matched = out.len(), "[stub] query");
        Ok(out)
    }

    /// Crea el registro, completa los campos que calcula el servidor y, si
    /// el tipo está ligado a un proceso, crea su registro de estado.
    fn create(&self, record: &Record) -> Result<RecordId> {
        let mut st = self.lock()?;
        st.record(Operation::Create, &record.logical_name, record.id, Some(record.clone()))?;

        let now = FieldValue::DateTime(Utc::now());
        let mut stored = record.clone();
        stored.set("createdon", now.clone());
        stored.set("modifiedon", now);
        if !stored.contains("statecode") {
            stored.set("statecode", FieldValue::OptionSet(0));
        }
        if !stored.contains("statuscode") {
            stored.set("statuscode", FieldValue::OptionSet(1));
        }
        if st.recalculated.contains(&stored.logical_name) {
            recalculate_line(&mut stored);
        }
        let id = st.insert(stored)?;

        if let Some(binding) = st.bindings.get(&record.logical_name).cloned() {
            let state = Record::new(binding.state_type.clone()).field(binding.link_field.clone(),
                                                                      EntityReference::new(record.logical_name.clone(), id))
                                                               .field("processid", binding.process_id)
                                                               .field("activestageid", binding.initial_stage_id)
                                                               .field("traversedpath", binding.initial_stage_id.to_string());
            let state_id = st.insert(state)?;
            debug!(root = %id, state = %state_id, "[stub] workflow state record created");
        }
        Ok(id)
    }

    /// Fusiona los campos enviados sobre el registro existente. Un campo
    /// enviado como nulo desaparece del registro.
    fn update(&self, record: &Record) -> Result<()> {
        let mut st = self.lock()?;
        st.record(Operation::Update, &record.logical_name, record.id, Some(record.clone()))?;
        let id = record.id
                       .ok_or_else(|| ServiceFault::invalid_argument("update requires a record id"))?;
        let recalc = st.recalculated.contains(&record.logical_name);
        let primary = primary_id_attribute(&record.logical_name);
        let existing = st.records
                         .get_mut(&record.logical_name)
                         .and_then(|m| m.get_mut(&id))
                         .ok_or_else(|| {
                             ServiceFault::not_found(format!("{} With Id = {} Does Not Exist", record.logical_name, id))
                         })?;
        for (k, v) in record.fields.iter() {
            if *k == primary {
                continue;
            }
            // un nulo borra el atributo: las lecturas no devuelven nulos
            if v.is_null() {
                existing.remove(k);
            } else {
                existing.set(k.clone(), v.clone());
            }
        }
        existing.set("modifiedon", FieldValue::DateTime(Utc::now()));
        if recalc {
            recalculate_line(existing);
        }
        Ok(())
    }

    /// Inserta una fila en la tabla intermedia por cada destino. Falla si
    /// el vínculo ya existe (restricción de clave del almacén).
    fn associate(&self, relationship: &str, source: &EntityReference, targets: &[EntityReference]) -> Result<()> {
        let mut st = self.lock()?;
        st.record(Operation::Associate, &source.logical_name, Some(source.id), None)?;
        for target in targets {
            link_pair(&mut st, relationship, source, target)?;
        }
        Ok(())
    }
}
