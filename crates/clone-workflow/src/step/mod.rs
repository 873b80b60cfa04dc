pub mod context;
pub mod trait_step;

pub use context::{LedgerEntry, StepContext};
pub use trait_step::{DuplicationStep, StepOutcome, StepResult};
