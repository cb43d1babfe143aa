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

//! src/core/types.rs
//!
//! Core type definitions for keybind chains
//!
//! This module defines the fundamental types used throughout the crate:
//! - `Command`: One command token with optional structured metadata
//! - `Environment`: Space or ground tag resolved from the command registry
//! - `KeyBinding`: A key bound to an ordered command chain
//! - `Alias`: A named command chain (`alias NAME "..."`)
//! - `ParsedFile`: Raw output of the keybind file parser
//!
//! All types implement serialisation so the host application can persist
//! or transmit them without an extra mapping layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Environment a command is valid in
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Ship (space) combat and navigation
    Space,
    /// Away team (ground) gameplay
    Ground,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Space => write!(f, "space"),
            Environment::Ground => write!(f, "ground"),
        }
    }
}

/// A structured parameter value
///
/// Used both for command parameters (tray, slot, active) and for the
/// parameters attached to validation issues.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    /// Returns the integer value, if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{}", n),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// A single game command
///
/// `raw` is exactly what the user authored (or what the file contained).
/// The remaining fields are filled in by a token parser when it recognises
/// the command; an unrecognised command carries only `raw`.
///
/// # Example
/// ```ignore
/// let cmd = Command::new("+STOTrayExecByTray 2 3")
///     .with_signature("TrayExecByTray(active,tray,slot)")
///     .with_parameter("tray", 2)
///     .with_parameter("slot", 3);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Command {
    /// Command text as authored
    pub raw: String,

    /// Registry category (e.g. "combat", "tray")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Space/ground tag, if the registry knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Structured parameters extracted by the token parser
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,

    /// Grammar signature, e.g. "TrayExecByTray(active,tray,slot)"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Command {
    /// Creates a plain command with no structured metadata
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Integer parameter lookup
    pub fn int_param(&self, name: &str) -> Option<i64> {
        self.parameters.get(name).and_then(ParamValue::as_int)
    }

    /// First word of the command with any leading `+` removed
    ///
    /// `+STOTrayExecByTray 0 1` → `STOTrayExecByTray`
    pub fn base_name(&self) -> &str {
        let first = self.raw.split_whitespace().next().unwrap_or("");
        first.trim_start_matches('+')
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A key bound to an ordered chain of commands
///
/// When `stabilize` is set and the chain has more than one command, the
/// exported line is the mirrored (palindromic) form of the chain.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyBinding {
    /// Game key name (e.g. "F1", "Space", "Alt+F4")
    pub key: String,

    /// Commands in execution order (never stored mirrored)
    pub commands: Vec<Command>,

    /// Export as a mirrored chain
    #[serde(default)]
    pub stabilize: bool,
}

impl KeyBinding {
    pub fn new(key: impl Into<String>, commands: Vec<Command>, stabilize: bool) -> Self {
        Self {
            key: key.into(),
            commands,
            stabilize,
        }
    }
}

/// Command payload of an alias
///
/// Older exports stored alias bodies as one un-split string; the canonical
/// form is a command list.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AliasCommands {
    Raw(String),
    Chain(Vec<Command>),
}

/// A named alias (`alias NAME <& ... &>`)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Alias {
    pub name: String,
    pub commands: AliasCommands,
}

impl Alias {
    pub fn raw(name: impl Into<String>, commands: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: AliasCommands::Raw(commands.into()),
        }
    }

    pub fn chain(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            commands: AliasCommands::Chain(commands),
        }
    }
}

/// A recoverable, per-line parse failure
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[error("Line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// Keybind entry as read from a file
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedKeybind {
    /// Command string exactly as it appeared between the quotes
    pub raw: String,
    pub commands: Vec<Command>,
    /// Token parser's verdict on whether the chain is a palindrome
    pub is_mirrored: bool,
}

/// Alias entry as read from a file
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedAlias {
    /// Un-split command string
    pub commands: String,
}

/// Everything recovered from one keybind file
///
/// Parsing is best-effort: `errors` lists the lines that could not be
/// understood while `keybinds` and `aliases` hold everything that could.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedFile {
    pub keybinds: BTreeMap<String, ParsedKeybind>,
    pub aliases: BTreeMap<String, ParsedAlias>,
    pub errors: Vec<ParseError>,
}

impl ParsedFile {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
