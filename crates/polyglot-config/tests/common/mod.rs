// polyglot-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for polyglot-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use polyglot_config::ConfigError;
use polyglot_config::PolyglotConfig;

/// Result type shared by the config suites.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `PolyglotConfig` without validating it.
pub fn config_from_toml(toml_str: &str) -> Result<PolyglotConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a config with defaults applied and a loopback bind.
pub fn minimal_config() -> Result<PolyglotConfig, toml::de::Error> {
    config_from_toml("[server]\nbind = \"127.0.0.1:8080\"\n")
}

/// Asserts that a result failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
