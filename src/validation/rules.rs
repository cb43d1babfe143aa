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

//! Built-in validation rules
//!
//! Every rule is a pure function of the `ValidationContext`. Rules never
//! see each other's output, so the order they run in only affects the
//! order of the reported issues.
//!
//! | Rule id                   | Checks                                   |
//! |---------------------------|------------------------------------------|
//! | `length`                  | Line close to or over the engine limit   |
//! | `stabilized_tray_only`    | Mirroring used with non-tray commands    |
//! | `key_command_count`       | Too many commands on one key             |
//! | `alias_mixed_environment` | Alias mixes space and ground commands    |
//! | `command_warning`         | Registry warnings for used commands      |
//! | `unsafe_keybind`          | Key reserved by the OS or client         |
//! | `tray_exec_optimization`  | Long line that shorter tray names fix    |

use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::registry::CommandRegistry;
use crate::core::types::Environment;
use crate::validation::settings::RuleSettings;
use crate::validation::types::{Issue, RuleOutcome, Severity, ValidationContext};

/// Verbose tray command name that has a shorter synonym
pub const VERBOSE_TRAY_NAME: &str = "STOTrayExecByTray";

/// Characters saved per verbose → short substitution
pub const TRAY_NAME_SAVINGS: usize = 3;

/// Message keys emitted by the built-in rules
pub const BUILTIN_MESSAGE_KEYS: &[&str] = &[
    "validation.length.error",
    "validation.length.warning",
    "validation.stabilized_tray_only",
    "validation.key_command_count",
    "validation.alias_mixed_environment",
    "validation.command_warning",
    "validation.unsafe_keybind",
    "validation.tray_exec_optimization",
];

/// A single validation check
///
/// Implementors provide `validate`; `run` fills in the defaults (rule id,
/// default severity and fallback message key) and is what the engine
/// calls.
pub trait Rule: Send + Sync {
    /// Stable identifier, also used for the fallback message key
    fn id(&self) -> &'static str;

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Returns `None` when the context is fine
    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome>;

    fn run(&self, context: &ValidationContext) -> Option<Issue> {
        let outcome = self.validate(context)?;
        Some(Issue {
            rule_id: self.id().to_string(),
            severity: outcome.severity.unwrap_or_else(|| self.default_severity()),
            message_key: outcome
                .key
                .unwrap_or_else(|| format!("validation.{}", self.id())),
            params: outcome.params,
            default_message: outcome.default_message,
        })
    }
}

/// Builds the built-in rules in their canonical order
pub fn default_rules(
    registry: Arc<dyn CommandRegistry>,
    settings: &RuleSettings,
) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(LengthRule::new(settings.length_warning, settings.length_error)),
        Box::new(StabilizedTrayOnlyRule::new()),
        Box::new(KeyCommandCountRule::new(settings.max_key_commands)),
        Box::new(AliasMixedEnvironmentRule::new(Arc::clone(&registry))),
        Box::new(CommandWarningRule::new(registry)),
        Box::new(UnsafeKeybindRule::new(&settings.unsafe_keys)),
        Box::new(TrayExecOptimizationRule::new(settings.length_warning)),
    ]
}

/// Line length against the engine's ~999 character limit
pub struct LengthRule {
    warning_at: usize,
    error_at: usize,
}

impl LengthRule {
    pub fn new(warning_at: usize, error_at: usize) -> Self {
        Self {
            warning_at,
            error_at,
        }
    }
}

impl Default for LengthRule {
    fn default() -> Self {
        let settings = RuleSettings::default();
        Self::new(settings.length_warning, settings.length_error)
    }
}

impl Rule for LengthRule {
    fn id(&self) -> &'static str {
        "length"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        if context.length >= self.error_at {
            Some(
                RuleOutcome::new()
                    .severity(Severity::Error)
                    .key("validation.length.error")
                    .param("length", context.length)
                    .param("limit", self.error_at)
                    .message(format!(
                        "Line is {} characters; the game truncates lines near 999",
                        context.length
                    )),
            )
        } else if context.length >= self.warning_at {
            Some(
                RuleOutcome::new()
                    .severity(Severity::Warning)
                    .key("validation.length.warning")
                    .param("length", context.length)
                    .param("limit", self.error_at)
                    .message(format!(
                        "Line is {} characters and approaching the limit",
                        context.length
                    )),
            )
        } else {
            None
        }
    }
}

/// Mirroring only makes sense for tray abilities
pub struct StabilizedTrayOnlyRule {
    tray_pattern: Regex,
}

impl StabilizedTrayOnlyRule {
    // Constant pattern, compiled once per rule
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            tray_pattern: Regex::new(r"(?i)trayexec|slot|stotrayexec")
                .expect("tray command pattern should be valid regex"),
        }
    }
}

impl Default for StabilizedTrayOnlyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for StabilizedTrayOnlyRule {
    fn id(&self) -> &'static str {
        "stabilized_tray_only"
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        if !context.stabilized {
            return None;
        }

        let non_tray = context
            .commands
            .iter()
            .filter(|cmd| !self.tray_pattern.is_match(&cmd.raw))
            .count();

        if non_tray == 0 {
            return None;
        }

        Some(
            RuleOutcome::new()
                .param("count", non_tray)
                .message("Execution order stabilization should only be used with tray abilities"),
        )
    }
}

/// Too many commands on one key
pub struct KeyCommandCountRule {
    max: usize,
}

impl KeyCommandCountRule {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Rule for KeyCommandCountRule {
    fn id(&self) -> &'static str {
        "key_command_count"
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        if context.is_alias || context.commands.len() <= self.max {
            return None;
        }

        Some(
            RuleOutcome::new()
                .param("count", context.commands.len())
                .param("max", self.max)
                .message(format!(
                    "{} commands on one key; consider moving some into an alias",
                    context.commands.len()
                )),
        )
    }
}

/// Aliases should target one environment
pub struct AliasMixedEnvironmentRule {
    registry: Arc<dyn CommandRegistry>,
}

impl AliasMixedEnvironmentRule {
    pub fn new(registry: Arc<dyn CommandRegistry>) -> Self {
        Self { registry }
    }
}

impl Rule for AliasMixedEnvironmentRule {
    fn id(&self) -> &'static str {
        "alias_mixed_environment"
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        if !context.is_alias {
            return None;
        }

        let environments: HashSet<Environment> = context
            .commands
            .iter()
            .filter_map(|cmd| self.registry.lookup_command_metadata(&cmd.raw))
            .filter_map(|metadata| metadata.environment)
            .collect();

        if !(environments.contains(&Environment::Space)
            && environments.contains(&Environment::Ground))
        {
            return None;
        }

        Some(
            RuleOutcome::new()
                .param("alias", context.key.as_str())
                .message("Alias mixes space and ground commands; consider one alias per environment"),
        )
    }
}

/// Collects registry warnings into a single issue
pub struct CommandWarningRule {
    registry: Arc<dyn CommandRegistry>,
}

impl CommandWarningRule {
    pub fn new(registry: Arc<dyn CommandRegistry>) -> Self {
        Self { registry }
    }
}

impl Rule for CommandWarningRule {
    fn id(&self) -> &'static str {
        "command_warning"
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        let warnings: Vec<String> = context
            .commands
            .iter()
            .filter_map(|cmd| {
                let metadata = self.registry.lookup_command_metadata(&cmd.raw)?;
                let warning = metadata.warning.filter(|w| !w.trim().is_empty())?;
                let name = metadata.name.unwrap_or_else(|| cmd.raw.clone());
                Some(format!("{} - {}", name, warning))
            })
            .collect();

        if warnings.is_empty() {
            return None;
        }

        let joined = warnings.join(", ");
        Some(
            RuleOutcome::new()
                .param("count", warnings.len())
                .param("warnings", joined.as_str())
                .message(format!("Command warnings: {}", joined)),
        )
    }
}

/// Keys the OS or client reserves
pub struct UnsafeKeybindRule {
    /// Lowercased for case-insensitive comparison
    keys: HashSet<String>,
}

impl UnsafeKeybindRule {
    pub fn new(keys: &[String]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.trim().to_lowercase()).collect(),
        }
    }
}

impl Rule for UnsafeKeybindRule {
    fn id(&self) -> &'static str {
        "unsafe_keybind"
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        if !self.keys.contains(&context.key.trim().to_lowercase()) {
            return None;
        }

        Some(
            RuleOutcome::new()
                .param("key", context.key.as_str())
                .message(format!(
                    "{} is reserved by the operating system or game client",
                    context.key
                )),
        )
    }
}

/// Suggests the shorter tray command name on long lines
pub struct TrayExecOptimizationRule {
    threshold: usize,
}

impl TrayExecOptimizationRule {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Rule for TrayExecOptimizationRule {
    fn id(&self) -> &'static str {
        "tray_exec_optimization"
    }

    fn validate(&self, context: &ValidationContext) -> Option<RuleOutcome> {
        if context.length < self.threshold {
            return None;
        }

        let occurrences = context
            .generated_line
            .to_lowercase()
            .matches(&VERBOSE_TRAY_NAME.to_lowercase())
            .count();
        if occurrences == 0 {
            return None;
        }

        let savings = occurrences * TRAY_NAME_SAVINGS;
        Some(
            RuleOutcome::new()
                .param("count", occurrences)
                .param("currentLength", context.length)
                .param("potentialSavings", savings)
                .param("newLength", context.length.saturating_sub(savings))
                .message(format!(
                    "Replacing {} with TrayExecByTray would save {} characters",
                    VERBOSE_TRAY_NAME, savings
                )),
        )
    }
}
