//! Validation module tests
//!
//! Contains test suites for the rule engine:
//! - Built-in rule boundaries and parameters
//! - Engine aggregation and rule independence
//! - Single-flight session behaviour

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod session_tests;

use std::sync::Arc;

use crate::core::registry::{CommandMetadata, StaticRegistry};
use crate::core::types::{Command, Environment};
use crate::validation::{RuleSettings, ValidationContext, ValidationEngine};

/// Helper to build a context without rendering a real line
pub(crate) fn context(key: &str, commands: &[&str], length: usize) -> ValidationContext {
    ValidationContext {
        key: key.to_string(),
        commands: commands.iter().map(|c| Command::new(*c)).collect(),
        length,
        stabilized: false,
        generated_line: format!("{} \"{}\"", key, commands.join(" $$ ")),
        is_alias: false,
    }
}

/// Registry with one space, one ground and one warned command
pub(crate) fn test_registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new();
    registry.insert(
        "FirePhasers",
        CommandMetadata {
            name: Some("Fire Phasers".to_string()),
            environment: Some(Environment::Space),
            ..CommandMetadata::default()
        },
    );
    registry.insert(
        "Crouch",
        CommandMetadata {
            name: Some("Crouch".to_string()),
            environment: Some(Environment::Ground),
            warning: Some("Toggles stance".to_string()),
            ..CommandMetadata::default()
        },
    );
    registry.insert(
        "Target_Self",
        CommandMetadata {
            name: Some("Target Self".to_string()),
            warning: Some("Clears your current target".to_string()),
            ..CommandMetadata::default()
        },
    );
    registry
}

pub(crate) fn default_engine() -> ValidationEngine {
    ValidationEngine::with_default_rules(Arc::new(test_registry()), &RuleSettings::default())
}
