mod generator;
mod scheduler;
mod topics;
mod trends;

pub use generator::ContentGenerator;
pub use scheduler::{CycleState, Orchestrator};
pub use topics::default_topics;
pub use trends::DailyTrendManager;
