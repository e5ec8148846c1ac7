use crate::config::GateConfig;
use std::time::Duration;

/// Settings shared by every subcommand that talks to the dashboard.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub base_url: String,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self { base_url, timeout }
    }

    #[must_use]
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::default()
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout)
    }
}
