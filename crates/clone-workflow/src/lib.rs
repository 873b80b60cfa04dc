//! clone-workflow: motor de duplicación de registros
//!
//! Orquesta la copia de un registro raíz junto con sus colecciones hijas,
//! su estado de proceso y sus asociaciones N:N sobre cualquier
//! `record_store::DataService`. La política de qué se copia viene de
//! `clone_policy::DuplicationProfile`.

pub mod config;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod host;
pub mod step;
pub mod steps;

pub use config::{ConfigError, EngineConfig};
pub use engine::{DuplicationEngine, DuplicationReport, DuplicationState};
pub use errors::{DuplicateError, InvariantError, Stage};
pub use factory::EngineFactory;
pub use host::{DuplicatePlugin, ParameterValue, PluginExecutionContext, OUTPUT_PARAMETER, TARGET_PARAMETER};
pub use step::{DuplicationStep, LedgerEntry, StepContext, StepOutcome};
