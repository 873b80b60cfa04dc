use crate::errors::{DuplicateError, InvariantError, Stage};
use crate::step::{DuplicationStep, LedgerEntry, StepContext, StepOutcome, StepResult};
use clone_policy::AssociationSpec;
use record_store::{EntityReference, RecordId};
use tracing::{debug, info};

/// Reconstruye en el clon las aristas N:N que tenía el original.
///
/// Los registros relacionados son datos compartidos: se enlazan, no se
/// copian.
pub struct AssociationReplicator {
  name: String,
  spec: AssociationSpec,
}

impl AssociationReplicator {
  pub fn new(spec: AssociationSpec) -> Self {
    Self { name: format!("replicate-associations:{}", spec.relationship_name), spec }
  }

  /// Una llamada `associate` por registro relacionado. Devuelve cuántas
  /// aristas se crearon.
  pub fn replicate_associations(&self,
                                ctx: &mut StepContext,
                                original_root: RecordId,
                                clone_root: &EntityReference)
                                -> Result<usize, DuplicateError> {
    let related = ctx.service
                     .query(&self.spec.link_query(original_root))
                     .map_err(DuplicateError::at(Stage::ReplicateAssociations))?;
    let mut count = 0;
    for r in &related {
      let id = r.id.ok_or_else(|| InvariantError::RecordWithoutId(self.spec.related_type.clone()))?;
      let target = EntityReference::new(self.spec.related_type.clone(), id);
      ctx.service
         .associate(&self.spec.relationship_name, clone_root, std::slice::from_ref(&target))
         .map_err(DuplicateError::at(Stage::ReplicateAssociations))?;
      debug!(relationship = %self.spec.relationship_name, target = %target, "arista replicada");
      ctx.record(LedgerEntry::Associated { relationship: self.spec.relationship_name.clone(),
                                           source: clone_root.clone(),
                                           target });
      count += 1;
    }
    info!(relationship = %self.spec.relationship_name, count, "asociaciones replicadas");
    Ok(count)
  }
}

impl DuplicationStep for AssociationReplicator {
  fn name(&self) -> &str {
    &self.name
  }

  fn stage(&self) -> Stage {
    Stage::ReplicateAssociations
  }

  fn execute(&self, ctx: &mut StepContext) -> StepResult {
    let clone = ctx.clone_ref(self.stage())?.clone();
    let original = ctx.original_ref.id;
    let count = self.replicate_associations(ctx, original, &clone)?;
    Ok(StepOutcome::AssociationsReplicated { relationship: self.spec.relationship_name.clone(), count })
  }
}
