use serde::{Deserialize, Serialize};

/// Tally of one generation run. Never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub success: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl GenerationOutcome {
    pub fn attempted(&self) -> u32 {
        self.success + self.failed
    }

    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }
}
