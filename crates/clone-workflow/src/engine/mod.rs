pub mod duplication_engine;
pub mod report;
pub mod state;

pub use duplication_engine::DuplicationEngine;
pub use report::DuplicationReport;
pub use state::DuplicationState;
