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

//! Import post-processing
//!
//! Turns a `ParsedFile` into editable bindings. A keybind whose command
//! string is a mirrored chain is collapsed back to its original commands
//! and flagged `stabilize`, so re-exporting it produces the same line.

use tracing::debug;

use crate::core::chain::unmirror;
use crate::core::parser::parse_file;
use crate::core::token::{TokenError, TokenParser};
use crate::core::types::{Alias, AliasCommands, Command, KeyBinding, ParseError, ParsedFile, ParsedKeybind};

/// Bindings recovered from one file
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedProfile {
    pub keybinds: Vec<KeyBinding>,
    pub aliases: Vec<Alias>,
    pub errors: Vec<ParseError>,
}

/// Resolves one parsed keybind, detecting stabilised chains
///
/// Uses the token parser's mirror verdict, so an injected parser decides
/// what counts as stabilised.
pub fn resolve_keybind(key: &str, parsed: &ParsedKeybind) -> KeyBinding {
    if parsed.is_mirrored {
        debug!(key, "mirrored chain detected on import");
        KeyBinding::new(key, unmirror(&parsed.commands), true)
    } else {
        KeyBinding::new(key, parsed.commands.clone(), false)
    }
}

/// Converts parser output into bindings and aliases
pub fn import_parsed(parsed: &ParsedFile) -> ImportedProfile {
    ImportedProfile {
        keybinds: parsed
            .keybinds
            .iter()
            .map(|(key, entry)| resolve_keybind(key, entry))
            .collect(),
        aliases: parsed
            .aliases
            .iter()
            .map(|(name, entry)| Alias::raw(name.as_str(), entry.commands.as_str()))
            .collect(),
        errors: parsed.errors.clone(),
    }
}

/// Parses and imports a keybind file in one step
pub fn import_file(content: &str, parser: &dyn TokenParser) -> ImportedProfile {
    import_parsed(&parse_file(content, parser))
}

impl Alias {
    /// Command list for this alias, splitting a raw body if needed
    pub fn to_chain(&self, parser: &dyn TokenParser) -> Result<Vec<Command>, TokenError> {
        match &self.commands {
            AliasCommands::Chain(commands) => Ok(commands.clone()),
            AliasCommands::Raw(raw) => Ok(parser.parse_command_token(raw)?.commands),
        }
    }
}
