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

use std::sync::Arc;

use super::{context, default_engine, test_registry};
use crate::core::token::ChainTokenParser;
use crate::core::types::Command;
use crate::validation::{
    default_rules, validate, Rule, RuleOutcome, RuleSettings, Severity, ValidationContext,
    ValidationEngine, ValidationStatus,
};

/// Rule that always reports with nothing but defaults
struct BareRule;

impl Rule for BareRule {
    fn id(&self) -> &'static str {
        "bare"
    }

    fn validate(&self, _context: &ValidationContext) -> Option<RuleOutcome> {
        Some(RuleOutcome::new())
    }
}

#[test]
fn test_empty_engine_succeeds() {
    let result = ValidationEngine::new().validate(&context("F1", &["FireAll"], 5000));
    assert!(result.is_success());
    assert!(result.issues().next().is_none());
}

#[test]
fn test_run_fills_defaults() {
    let issue = BareRule.run(&context("F1", &[], 10)).unwrap();

    assert_eq!(issue.rule_id, "bare");
    assert_eq!(issue.severity, Severity::Warning);
    assert_eq!(issue.message_key, "validation.bare");
    assert!(issue.params.is_empty());
    assert!(issue.default_message.is_none());
}

#[test]
fn test_errors_dominate_warnings() {
    let mut engine = default_engine();
    engine.push_rule(Box::new(BareRule));

    let result = engine.validate(&context("Alt+F4", &["FireAll"], 995));
    assert_eq!(result.severity, ValidationStatus::Error);
    assert!(result.has_errors());
    assert_eq!(result.errors.len(), 1);
    assert!(result.warnings.iter().any(|i| i.rule_id == "unsafe_keybind"));
    assert!(result.warnings.iter().any(|i| i.rule_id == "bare"));
}

#[test]
fn test_rule_order_does_not_change_outcome() {
    let registry = Arc::new(test_registry());
    let settings = RuleSettings::default();

    let forward = default_rules(registry.clone(), &settings);
    let mut reversed = default_rules(registry, &settings);
    reversed.reverse();

    let mut ctx = context("Alt+F4", &["FirePhasers", "Crouch", "Target_Self"], 930);
    ctx.stabilized = true;
    ctx.generated_line = "Alt+F4 \"+STOTrayExecByTray 0 0 $$ Crouch\"".to_string();

    let a = validate(&ctx, &forward);
    let b = validate(&ctx, &reversed);

    assert_eq!(a.severity, b.severity);

    let mut ids_a: Vec<_> = a.issues().map(|i| i.rule_id.clone()).collect();
    let mut ids_b: Vec<_> = b.issues().map(|i| i.rule_id.clone()).collect();
    ids_a.sort();
    ids_b.sort();
    assert_eq!(ids_a, ids_b);
}

#[test]
fn test_real_context_end_to_end() {
    let parser = ChainTokenParser::new();
    let commands = vec![
        Command::new("+TrayExecByTray 0 0"),
        Command::new("+TrayExecByTray 0 1"),
    ];
    let ctx = ValidationContext::for_keybind("F2", &commands, true, &parser);

    let result = default_engine().validate(&ctx);
    assert!(ctx.stabilized);
    assert_eq!(ctx.length, ctx.generated_line.chars().count());
    assert_eq!(result.severity, ValidationStatus::Success);
}

#[test]
fn test_alias_context_end_to_end() {
    let parser = ChainTokenParser::with_registry(Arc::new(test_registry()));
    let commands = vec![Command::new("FirePhasers"), Command::new("Crouch")];
    let ctx = ValidationContext::for_alias("Mixed", &commands, &parser);

    let result = default_engine().validate(&ctx);
    assert!(ctx.is_alias);
    assert!(ctx.generated_line.starts_with("alias Mixed <& "));
    assert!(result
        .warnings
        .iter()
        .any(|i| i.rule_id == "alias_mixed_environment"));
    assert!(result.warnings.iter().any(|i| i.rule_id == "command_warning"));
}
