use crate::errors::{DuplicateError, InvariantError, Stage};
use crate::step::{DuplicationStep, LedgerEntry, StepContext, StepOutcome, StepResult};
use clone_policy::CloneSpec;
use record_store::EntityReference;
use tracing::info;

/// Crea el registro raíz clonado a partir de la imagen completa del
/// original aplicando la política de campos.
pub struct RootCloner {
  spec: CloneSpec,
}

impl RootCloner {
  pub fn new(spec: CloneSpec) -> Self {
    Self { spec }
  }

  pub fn spec(&self) -> &CloneSpec {
    &self.spec
  }

  /// Construye el candidato, lo crea y devuelve la referencia al clon. El
  /// id lo asigna el servicio y nunca coincide con el del original.
  pub fn clone_root(&self, ctx: &mut StepContext) -> Result<EntityReference, DuplicateError> {
    let candidate = self.spec.apply(&ctx.original);
    let id = ctx.service.create(&candidate).map_err(DuplicateError::at(Stage::CloneRoot))?;
    if id == ctx.original_ref.id {
      return Err(InvariantError::CloneIdentityReused(id).into());
    }
    let clone = EntityReference::new(candidate.logical_name.clone(), id);
    ctx.record(LedgerEntry::Created { record: clone.clone() });
    info!(original = %ctx.original_ref, clone = %clone, fields = candidate.len(), "clon raíz creado");
    Ok(clone)
  }
}

impl DuplicationStep for RootCloner {
  fn name(&self) -> &str {
    "clone-root"
  }

  fn stage(&self) -> Stage {
    Stage::CloneRoot
  }

  fn execute(&self, ctx: &mut StepContext) -> StepResult {
    let clone = self.clone_root(ctx)?;
    ctx.set_clone(clone.clone());
    Ok(StepOutcome::RootCloned { clone })
  }
}
