pub mod association_replicator;
pub mod dependent_cloner;
pub mod root_cloner;
pub mod workflow_state;

pub use association_replicator::AssociationReplicator;
pub use dependent_cloner::DependentCollectionCloner;
pub use root_cloner::RootCloner;
pub use workflow_state::WorkflowStateTransfer;
