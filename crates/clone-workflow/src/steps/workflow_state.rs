use crate::errors::{DuplicateError, InvariantError, Stage};
use crate::step::{DuplicationStep, LedgerEntry, StepContext, StepOutcome, StepResult};
use clone_policy::WorkflowStateSpec;
use record_store::{EntityReference, RecordId};
use tracing::info;

/// Copia al registro de estado de proceso del clon el proceso y el camino
/// recorrido del original.
///
/// El servicio crea el registro de estado junto con el clon raíz; este paso
/// sólo lo actualiza y nunca crea uno.
pub struct WorkflowStateTransfer {
  spec: WorkflowStateSpec,
}

impl WorkflowStateTransfer {
  pub fn new(spec: WorkflowStateSpec) -> Self {
    Self { spec }
  }

  /// Devuelve `Ok(false)` si el original no tiene registro de estado; en
  /// ese caso el del clon no se toca.
  pub fn transfer_workflow_state(&self,
                                 ctx: &mut StepContext,
                                 original_root: RecordId,
                                 clone_root: &EntityReference)
                                 -> Result<bool, DuplicateError> {
    let at = || DuplicateError::at(Stage::TransferWorkflowState);
    let original_state = ctx.service.query(&self.spec.state_query(original_root)).map_err(at())?.into_iter().next();
    let Some(original_state) = original_state else {
      info!(original = %original_root, state_type = %self.spec.state_type, "el original no tiene estado de proceso");
      return Ok(false);
    };

    let clone_state = ctx.service
                         .query(&self.spec.state_query(clone_root.id))
                         .map_err(at())?
                         .into_iter()
                         .next()
                         .ok_or_else(|| InvariantError::MissingCloneWorkflowState { clone: clone_root.clone(),
                                                                                    state_type: self.spec
                                                                                                    .state_type
                                                                                                    .clone() })?;
    let clone_state_id = clone_state.id.ok_or_else(|| InvariantError::RecordWithoutId(self.spec.state_type.clone()))?;

    let patch = self.spec.transfer_patch(&original_state, clone_state_id);
    ctx.service.update(&patch).map_err(at())?;
    ctx.record(LedgerEntry::Updated { record: EntityReference::new(self.spec.state_type.clone(), clone_state_id) });
    info!(clone = %clone_root, state = %clone_state_id, fields = patch.len(), "estado de proceso transferido");
    Ok(true)
  }
}

impl DuplicationStep for WorkflowStateTransfer {
  fn name(&self) -> &str {
    "transfer-workflow-state"
  }

  fn stage(&self) -> Stage {
    Stage::TransferWorkflowState
  }

  fn execute(&self, ctx: &mut StepContext) -> StepResult {
    let clone = ctx.clone_ref(self.stage())?.clone();
    let original = ctx.original_ref.id;
    let transferred = self.transfer_workflow_state(ctx, original, &clone)?;
    Ok(StepOutcome::WorkflowStateTransferred { transferred })
  }
}
