use crate::engine::report::{DuplicationReport, ReportBuilder};
use crate::engine::state::DuplicationState;
use crate::errors::{DuplicateError, InvariantError, Stage};
use crate::step::{DuplicationStep, StepContext};
use crate::steps::{AssociationReplicator, DependentCollectionCloner, RootCloner, WorkflowStateTransfer};
use chrono::Utc;
use clone_policy::DuplicationProfile;
use record_store::{ColumnSet, DataService, EntityReference};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

/// Orquestador de la duplicación de un registro raíz.
///
/// Ejecuta, en orden y sin paralelismo, la clonación de la raíz, de sus
/// colecciones hijas, la transferencia del estado de proceso y la
/// replicación de asociaciones. Se detiene en el primer fallo y no deshace
/// nada: lo ya creado queda en el almacén y se informa en la traza.
pub struct DuplicationEngine {
  service: Arc<dyn DataService>,
  profile: DuplicationProfile,
  steps: Vec<Box<dyn DuplicationStep>>,
}

impl DuplicationEngine {
  /// Construye el motor con los pasos que describe `profile`.
  pub fn new(service: Arc<dyn DataService>, profile: DuplicationProfile) -> Result<Self, DuplicateError> {
    profile.validate().map_err(InvariantError::from)?;
    let mut steps: Vec<Box<dyn DuplicationStep>> = vec![Box::new(RootCloner::new(profile.root.clone()))];
    for d in &profile.dependents {
      steps.push(Box::new(DependentCollectionCloner::new(d.clone())));
    }
    if let Some(w) = &profile.workflow_state {
      steps.push(Box::new(WorkflowStateTransfer::new(w.clone())));
    }
    for a in &profile.associations {
      steps.push(Box::new(AssociationReplicator::new(a.clone())));
    }
    Ok(Self { service, profile, steps })
  }

  pub fn profile(&self) -> &DuplicationProfile {
    &self.profile
  }

  pub fn root_type(&self) -> &str {
    self.profile.root_type()
  }

  /// Nombres de los pasos registrados, en orden de registro.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name()).collect()
  }

  /// Duplica `root` y devuelve la referencia al clon. Devuelve `Ok(None)`
  /// sin tocar el almacén si `root` no es del tipo raíz del perfil.
  pub fn duplicate(&self, root: &EntityReference) -> Result<Option<EntityReference>, DuplicateError> {
    Ok(self.run(root)?.map(|r| r.clone))
  }

  /// Igual que `duplicate` pero devuelve el reporte completo.
  pub fn run(&self, root: &EntityReference) -> Result<Option<DuplicationReport>, DuplicateError> {
    if root.logical_name != self.root_type() {
      info!(target_type = %root.logical_name, expected = %self.root_type(), "tipo de registro no soportado; se ignora");
      return Ok(None);
    }
    let span = info_span!("duplicate", original = %root);
    let _guard = span.enter();
    let started_at = Utc::now();
    info!("verificando duplicación");

    let mut state = DuplicationState::Start;
    let mut transitions = vec![state];

    let original = match self.service.fetch(&root.logical_name, root.id, &ColumnSet::All) {
      Ok(r) => r,
      Err(fault) => {
        let err = DuplicateError::from_fetch(root, fault);
        state = state.fail(Stage::FetchRoot);
        log_failure(&err, state, &[]);
        return Err(err);
      }
    };
    debug!(fields = original.len(), "original leído");

    let mut ctx = StepContext::new(self.service.clone(), original, root.clone());
    let mut acc = ReportBuilder::default();
    for stage in Stage::PIPELINE {
      if let Err(err) = self.run_stage(stage, &mut ctx, &mut acc) {
        state = state.fail(stage);
        log_failure(&err, state, &ctx.created());
        return Err(err);
      }
      state = state.complete(stage)?;
      transitions.push(state);
      debug!(state = %state, "etapa completada");
    }
    state = state.finish()?;
    transitions.push(state);

    let clone = acc.clone.ok_or(InvariantError::CloneNotCreated(Stage::CloneRoot))?;
    info!(clone = %clone, writes = ctx.ledger().len(), "duplicación completada");
    Ok(Some(DuplicationReport { original: root.clone(),
                                clone,
                                dependents_cloned: acc.dependents_cloned,
                                state_transferred: acc.state_transferred,
                                associations_replicated: acc.associations_replicated,
                                transitions,
                                ledger: ctx.ledger().to_vec(),
                                started_at,
                                finished_at: Utc::now() }))
  }

  fn run_stage(&self, stage: Stage, ctx: &mut StepContext, acc: &mut ReportBuilder) -> Result<(), DuplicateError> {
    for step in self.steps.iter().filter(|s| s.stage() == stage) {
      debug!(step = step.name(), "ejecutando paso");
      let outcome = step.execute(ctx)?;
      acc.apply(outcome);
    }
    Ok(())
  }
}

fn log_failure(err: &DuplicateError, state: DuplicationState, created: &[&EntityReference]) {
  let created: Vec<String> = created.iter().map(|r| r.to_string()).collect();
  error!(state = %state, error = %err, fault = ?err.fault(), "duplicación abortada");
  if !created.is_empty() {
    warn!(count = created.len(), records = ?created, "registros creados que quedan en el almacén");
  }
}
