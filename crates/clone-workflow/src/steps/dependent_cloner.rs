use crate::errors::{DuplicateError, Stage};
use crate::step::{DuplicationStep, LedgerEntry, StepContext, StepOutcome, StepResult};
use clone_policy::DependentSpec;
use record_store::{EntityReference, RecordId};
use tracing::{debug, info};

/// Replica una colección de hijos del original bajo el clon.
pub struct DependentCollectionCloner {
  name: String,
  spec: DependentSpec,
}

impl DependentCollectionCloner {
  pub fn new(spec: DependentSpec) -> Self {
    Self { name: format!("clone-dependents:{}", spec.child_type), spec }
  }

  pub fn spec(&self) -> &DependentSpec {
    &self.spec
  }

  /// Consulta los hijos de `original_root` y crea uno nuevo por cada uno,
  /// ligado a `clone_root`, en el orden devuelto por la consulta. Se
  /// detiene en el primer fallo; los hijos ya creados quedan en el libro.
  pub fn clone_dependents(&self,
                          ctx: &mut StepContext,
                          original_root: RecordId,
                          clone_root: &EntityReference)
                          -> Result<usize, DuplicateError> {
    let children =
      ctx.service.query(&self.spec.query_filter(original_root)).map_err(DuplicateError::at(Stage::CloneDependents))?;
    let mut count = 0;
    for child in &children {
      let candidate = self.spec.clone_child(child, clone_root);
      let id = ctx.service.create(&candidate).map_err(DuplicateError::at(Stage::CloneDependents))?;
      let created = EntityReference::new(candidate.logical_name.clone(), id);
      debug!(source = ?child.id, clone = %created, "hijo clonado");
      ctx.record(LedgerEntry::Created { record: created });
      count += 1;
    }
    info!(child_type = %self.spec.child_type, count, "colección de hijos clonada");
    Ok(count)
  }
}

impl DuplicationStep for DependentCollectionCloner {
  fn name(&self) -> &str {
    &self.name
  }

  fn stage(&self) -> Stage {
    Stage::CloneDependents
  }

  fn execute(&self, ctx: &mut StepContext) -> StepResult {
    let clone = ctx.clone_ref(self.stage())?.clone();
    let original = ctx.original_ref.id;
    let count = self.clone_dependents(ctx, original, &clone)?;
    Ok(StepOutcome::DependentsCloned { child_type: self.spec.child_type.clone(), count })
  }
}
