// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rule-based chain validation.
//!
//! The engine runs an ordered list of independent rules over one
//! `ValidationContext` and sorts what they report into errors and
//! warnings:
//!
//! - **Error**: the chain must not be exported (line too long)
//! - **Warning**: export is allowed, the user should review the chain
//! - **Success**: nothing to report
//!
//! Every rule runs on every call; a rule never sees another rule's result,
//! so reordering the list only reorders the reported issues.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use sto_keybind_manager::core::{ChainTokenParser, Command, StaticRegistry};
//! use sto_keybind_manager::validation::{
//!     RuleSettings, ValidationContext, ValidationEngine, ValidationStatus,
//! };
//!
//! let engine = ValidationEngine::with_default_rules(
//!     Arc::new(StaticRegistry::new()),
//!     &RuleSettings::default(),
//! );
//! let parser = ChainTokenParser::new();
//! let commands = vec![Command::new("FirePhasers"), Command::new("FireAll")];
//! let context = ValidationContext::for_keybind("F1", &commands, false, &parser);
//!
//! let result = engine.validate(&context);
//! assert_eq!(result.severity, ValidationStatus::Success);
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::core::registry::CommandRegistry;

pub mod rules;
pub mod session;
pub mod settings;
pub mod types;

pub use rules::{default_rules, Rule, BUILTIN_MESSAGE_KEYS};
pub use session::ValidationSession;
pub use settings::{RuleSettings, SettingsError};
pub use types::{
    Issue, IssueParams, RuleOutcome, Severity, ValidationContext, ValidationResult,
    ValidationStatus,
};

/// Runs `rules` in order over `context`
pub fn validate(context: &ValidationContext, rules: &[Box<dyn Rule>]) -> ValidationResult {
    let result = ValidationResult::from_issues(rules.iter().filter_map(|rule| rule.run(context)));
    debug!(
        key = %context.key,
        status = %result.severity,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "validated chain"
    );
    result
}

/// Fixed-order rule list built once at startup
pub struct ValidationEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Engine with no rules (every context succeeds)
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Engine with the built-in rules
    pub fn with_default_rules(registry: Arc<dyn CommandRegistry>, settings: &RuleSettings) -> Self {
        Self {
            rules: default_rules(registry, settings),
        }
    }

    /// Appends a rule; it runs after every rule already registered
    pub fn push_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn validate(&self, context: &ValidationContext) -> ValidationResult {
        validate(context, &self.rules)
    }
}

#[cfg(test)]
mod tests;
