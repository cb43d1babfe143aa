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

//! src/core/token.rs
//!
//! Command string tokenisation
//!
//! Splits a `$$`-delimited command string into `Command` values and
//! recognises the tray-execution family so the normaliser can rewrite it.
//!
//! # Architecture
//! The full game command grammar belongs to the host application and is
//! injected through the `TokenParser` trait. `ChainTokenParser` is the
//! reference implementation shipped with the crate: it understands only
//! the tray-execution commands and treats everything else as opaque text.
//!
//! Recognised forms (case-insensitive names, optional `STO` prefix):
//! - `+TrayExecByTray <tray> <slot>`
//! - `TrayExecByTray <active> <tray> <slot>`
//! - `+TrayExecByTrayWithBackup <tray> <slot> <backupTray> <backupSlot>`
//! - `TrayExecByTrayWithBackup <active> <tray> <slot> <backupTray> <backupSlot>`

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, digit1, space0, space1},
    combinator::{eof, map_res, opt, recognize},
    multi::many0,
    sequence::preceded,
    IResult, Parser,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::chain::{is_mirrored_tokens, split_command_string};
use crate::core::registry::CommandRegistry;
use crate::core::types::Command;

/// Signature emitted for plain tray execution
pub const TRAY_EXEC_SIGNATURE: &str = "TrayExecByTray(active,tray,slot)";

/// Signature emitted for tray execution with a backup slot
pub const TRAY_EXEC_WITH_BACKUP_SIGNATURE: &str =
    "TrayExecByTrayWithBackup(active,tray,slot,backup_tray,backup_slot)";

/// Tokenisation failures
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    /// `a $$ $$ b` style gaps in the chain
    #[error("Empty command at position {position}")]
    EmptyCommand { position: usize },
}

/// Structured breakdown of a full command string
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedCommandString {
    pub commands: Vec<Command>,
    /// The command string is a palindromic (stabilised) chain
    pub is_mirrored: bool,
}

/// Turns a raw command string into structured commands
pub trait TokenParser: Send + Sync {
    fn parse_command_token(&self, raw: &str) -> Result<ParsedCommandString, TokenError>;
}

/// Tray-execution command family
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrayFamily {
    /// `TrayExecByTray`
    Tray,
    /// `TrayExecByTrayWithBackup`
    TrayWithBackup,
}

impl TrayFamily {
    /// Classifies a command name or signature
    ///
    /// `WithBackup` is checked first because the plain name is a substring
    /// of it.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("trayexecbytraywithbackup") {
            Some(TrayFamily::TrayWithBackup)
        } else if lower.contains("trayexecbytray") {
            Some(TrayFamily::Tray)
        } else {
            None
        }
    }

    pub fn signature(&self) -> &'static str {
        match self {
            TrayFamily::Tray => TRAY_EXEC_SIGNATURE,
            TrayFamily::TrayWithBackup => TRAY_EXEC_WITH_BACKUP_SIGNATURE,
        }
    }

    /// Number of slot coordinates (excluding `active`)
    fn coordinate_count(&self) -> usize {
        match self {
            TrayFamily::Tray => 2,
            TrayFamily::TrayWithBackup => 4,
        }
    }
}

/// A tray-like call before its arity is checked
#[derive(Debug, PartialEq)]
struct TrayCall<'a> {
    toggle: bool,
    name: &'a str,
    args: Vec<i64>,
}

fn parse_integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize((opt(char('-')), digit1)), |s: &str| s.parse::<i64>()).parse(input)
}

/// Parses `[+]Name int int ...` with nothing after the last integer
fn parse_tray_call(input: &str) -> IResult<&str, TrayCall<'_>> {
    let (input, toggle) = opt(char('+')).parse(input)?;
    let (input, name) = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_').parse(input)?;
    let (input, args) = many0(preceded(space1, parse_integer)).parse(input)?;
    let (input, _) = (space0, eof).parse(input)?;

    Ok((
        input,
        TrayCall {
            toggle: toggle.is_some(),
            name,
            args,
        },
    ))
}

/// Reference token parser
///
/// Optionally enriches each command with category and environment from a
/// command registry.
#[derive(Clone, Default)]
pub struct ChainTokenParser {
    registry: Option<Arc<dyn CommandRegistry>>,
}

impl ChainTokenParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Arc<dyn CommandRegistry>) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Builds a `Command` for one already-trimmed token
    pub fn parse_single(&self, token: &str) -> Command {
        let mut command = parse_tray_command(token).unwrap_or_else(|| Command::new(token));

        if let Some(metadata) = self
            .registry
            .as_ref()
            .and_then(|registry| registry.lookup_command_metadata(token))
        {
            command.category = metadata.category;
            command.environment = metadata.environment;
        }

        command
    }
}

/// Recognises a tray-execution command, returning `None` for anything else
pub fn parse_tray_command(token: &str) -> Option<Command> {
    let (_, call) = parse_tray_call(token).ok()?;
    let family = TrayFamily::detect(call.name)?;

    let expected = family.coordinate_count() + usize::from(!call.toggle);
    if call.args.len() != expected {
        debug!(token, expected, found = call.args.len(), "tray command arity mismatch");
        return None;
    }

    let mut command = Command::new(token).with_signature(family.signature());
    let mut args = call.args.iter().copied();

    if !call.toggle {
        command = command.with_parameter("active", args.next()?);
    }
    command = command
        .with_parameter("tray", args.next()?)
        .with_parameter("slot", args.next()?);
    if family == TrayFamily::TrayWithBackup {
        command = command
            .with_parameter("backup_tray", args.next()?)
            .with_parameter("backup_slot", args.next()?);
    }

    Some(command)
}

impl TokenParser for ChainTokenParser {
    fn parse_command_token(&self, raw: &str) -> Result<ParsedCommandString, TokenError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(ParsedCommandString::default());
        }

        let tokens = split_command_string(trimmed);
        for (index, token) in tokens.iter().enumerate() {
            if token.is_empty() {
                return Err(TokenError::EmptyCommand { position: index + 1 });
            }
        }

        Ok(ParsedCommandString {
            commands: tokens.iter().map(|token| self.parse_single(token)).collect(),
            is_mirrored: is_mirrored_tokens(&tokens),
        })
    }
}
