//! clone-policy: política declarativa de clonado por tipo de registro
//!
//! Define qué campos se copian, se transforman o se descartan al duplicar
//! un registro (`CloneSpec`), cómo se replican sus hijos (`DependentSpec`),
//! su estado de proceso (`WorkflowStateSpec`) y sus aristas N:N
//! (`AssociationSpec`). `DuplicationProfile` agrupa todo para un tipo raíz.
mod association_spec;
mod clone_spec;
mod dependent_spec;
mod errors;
mod field_rule;
mod profile;
mod workflow_spec;

pub use association_spec::AssociationSpec;
pub use clone_spec::{CloneSpec, PostTransform};
pub use dependent_spec::DependentSpec;
pub use errors::PolicyError;
pub use field_rule::{FieldPattern, FieldRule, RuleAction, DEFAULT_RULES};
pub use profile::{DuplicationProfile, CLONED_PREFIX};
pub use workflow_spec::{default_transfer_fields, WorkflowStateSpec};
