mod mode;
mod models;
mod report;

pub use mode::FileMode;
pub use models::*;
pub use report::{Outcome, Report, StepOutcome};
