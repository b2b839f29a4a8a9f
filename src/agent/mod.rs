mod orchestrator;
mod scheduler;

pub use orchestrator::Orchestrator;
pub use scheduler::{Scheduler, Trigger};
