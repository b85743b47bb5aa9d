use log::{debug, info, warn};

/// Thin wrapper over the `log` facade that tags records with a component name.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!(target: "dartcore", "[{}] {}", self.component, message);
    }

    pub fn detail(&self, message: &str) {
        debug!(target: "dartcore", "[{}] {}", self.component, message);
    }

    pub fn warn(&self, message: &str) {
        warn!(target: "dartcore", "[{}] {}", self.component, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("engine")
    }
}
