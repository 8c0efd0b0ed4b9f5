//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_replay(config, &mut result);
        Self::validate_orchestrator(config, &mut result);
        Self::validate_storage(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_replay(config: &Config, result: &mut ValidationResult) {
        if config.locator.timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "locator.timeout_ms",
                "timeout_ms must be greater than 0",
            ));
        }

        if config.executor.settle_delay_ms > 10_000 {
            result.add_warning(ValidationWarning::new(
                "executor.settle_delay_ms",
                "settle delay above 10s will make replay very slow",
            ));
        }

        if config.store.lookup_limit == 0 {
            result.add_error(ValidationError::new(
                "store.lookup_limit",
                "lookup_limit must be greater than 0",
            ));
        }
    }

    fn validate_orchestrator(config: &Config, result: &mut ValidationResult) {
        let orch = &config.orchestrator;

        if orch.max_pages == 0 {
            result.add_error(ValidationError::new(
                "orchestrator.max_pages",
                "max_pages must be greater than 0",
            ));
        }

        if orch.max_pages > 100 {
            result.add_warning(ValidationWarning::new(
                "orchestrator.max_pages",
                "max_pages is very high (>100), runaway flows will be slow to abort",
            ));
        }

        if orch.max_attempts_per_layer == 0 {
            result.add_error(ValidationError::new(
                "orchestrator.max_attempts_per_layer",
                "max_attempts_per_layer must be greater than 0",
            ));
        }

        if orch.stuck_repeat_limit == 0 {
            result.add_error(ValidationError::new(
                "orchestrator.stuck_repeat_limit",
                "stuck_repeat_limit must be greater than 0",
            ));
        }

        if !orch.max_cost.is_finite() || orch.max_cost < 0.0 {
            result.add_error(ValidationError::new(
                "orchestrator.max_cost",
                "max_cost must be a non-negative number",
            ));
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        let valid_backends = ["sqlite", "memory"];
        if !valid_backends.contains(&config.storage.backend.as_str()) {
            result.add_error(ValidationError::new(
                "storage.backend",
                format!(
                    "Unknown storage backend '{}', valid values: {:?}",
                    config.storage.backend, valid_backends
                ),
            ));
        }

        if config.storage.backend == "sqlite" && config.storage.path.is_none() {
            result.add_warning(ValidationWarning::new(
                "storage.path",
                "SQLite path not set, will use default location",
            ));
        }

        if config.storage.backend == "memory" {
            result.add_warning(ValidationWarning::new(
                "storage.backend",
                "memory backend discards manuals when the process exits",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            result.add_error(ValidationError::new(
                "logging.format",
                format!(
                    "Unknown log format '{}', valid values: {:?}",
                    config.logging.format, valid_formats
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
