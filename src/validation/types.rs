//! Validation issue and context types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::chain::{build_preview, rendered_length, split_command_string, CHAIN_JOINER};
use crate::core::normalizer::CommandNormalizer;
use crate::core::token::TokenParser;
use crate::core::types::{Command, ParamValue};

/// Severity of a single issue
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Export allowed, user should look
    Warning,
    /// Export blocked
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Aggregate outcome of a validation run
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Success,
    Warning,
    Error,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Success => write!(f, "success"),
            ValidationStatus::Warning => write!(f, "warning"),
            ValidationStatus::Error => write!(f, "error"),
        }
    }
}

/// Parameters attached to an issue for message interpolation
pub type IssueParams = BTreeMap<String, ParamValue>;

/// A classified finding about one chain
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Issue {
    /// Id of the rule that produced it
    pub rule_id: String,
    pub severity: Severity,
    /// Message catalog key
    pub message_key: String,
    #[serde(default)]
    pub params: IssueParams,
    /// English text used when the catalog has no translation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_message: Option<String>,
}

impl Issue {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

/// What a rule reports before defaults are filled in
///
/// Any field left empty is taken from the rule: its default severity and
/// the fallback message key `validation.<rule id>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleOutcome {
    pub severity: Option<Severity>,
    pub key: Option<String>,
    pub params: IssueParams,
    pub default_message: Option<String>,
}

impl RuleOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.default_message = Some(message.into());
        self
    }
}

/// Everything a rule may inspect
///
/// Built fresh for each validation call and only ever borrowed immutably.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationContext {
    /// Key name, or alias name when `is_alias`
    pub key: String,
    /// Original (un-mirrored) commands
    pub commands: Vec<Command>,
    /// Character length of `generated_line`
    pub length: usize,
    pub stabilized: bool,
    /// Exact exported line
    pub generated_line: String,
    pub is_alias: bool,
}

impl ValidationContext {
    /// Context for a keybind, rendering the line the way export does
    pub fn for_keybind(
        key: &str,
        commands: &[Command],
        stabilize: bool,
        parser: &dyn TokenParser,
    ) -> Self {
        let preview = build_preview(key, commands, stabilize, parser);
        Self {
            key: key.to_string(),
            commands: commands.to_vec(),
            length: preview.length,
            stabilized: stabilize,
            generated_line: preview.line,
            is_alias: false,
        }
    }

    /// Context for an alias (`alias NAME <& ... &>`)
    pub fn for_alias(name: &str, commands: &[Command], parser: &dyn TokenParser) -> Self {
        let line = alias_line(name, &CommandNormalizer::new(parser).normalize(commands));
        Self {
            key: name.to_string(),
            commands: commands.to_vec(),
            length: rendered_length(&line),
            stabilized: false,
            generated_line: line,
            is_alias: true,
        }
    }

    /// Context for an alias body that does not split into a chain
    ///
    /// The line is the body written verbatim, as export writes it. The
    /// commands are the non-empty `$$` segments, taken without tokenising.
    pub fn for_raw_alias(name: &str, raw: &str) -> Self {
        let line = raw_alias_line(name, raw);
        Self {
            key: name.to_string(),
            commands: split_command_string(raw)
                .into_iter()
                .filter(|segment| !segment.is_empty())
                .map(Command::new)
                .collect(),
            length: rendered_length(&line),
            stabilized: false,
            generated_line: line,
            is_alias: true,
        }
    }
}

/// Renders an alias definition in bracket syntax
pub fn alias_line(name: &str, normalized: &[String]) -> String {
    format!("alias {} <& {} &>", name, normalized.join(CHAIN_JOINER))
}

/// Bracket syntax around an unmodified alias body
pub fn raw_alias_line(name: &str, raw: &str) -> String {
    format!("alias {} <& {} &>", name, raw.trim())
}

/// Outcome of running a rule set over one context
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ValidationResult {
    pub severity: ValidationStatus,
    pub warnings: Vec<Issue>,
    pub errors: Vec<Issue>,
}

impl ValidationResult {
    /// Partitions issues and derives the aggregate status
    pub fn from_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let (errors, warnings): (Vec<Issue>, Vec<Issue>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);

        let severity = if !errors.is_empty() {
            ValidationStatus::Error
        } else if !warnings.is_empty() {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Success
        };

        Self {
            severity,
            warnings,
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.severity == ValidationStatus::Success
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors first, then warnings
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}
