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

//! Command normalisation
//!
//! Rewrites tray-execution commands into one canonical spelling so that
//! mirroring and length checks do not depend on how the user typed them:
//!
//! | Input                              | Output                          |
//! |------------------------------------|---------------------------------|
//! | `TrayExecByTray 1 2 3`             | `+TrayExecByTray 2 3`           |
//! | `TrayExecByTray 0 2 3`             | `TrayExecByTray 0 2 3`          |
//! | `+TrayExecByTrayWithBackup 0 1 2 3`| `+TrayExecByTrayWithBackup 0 1 2 3` |
//!
//! Everything else passes through untouched. Normalisation never fails and
//! never drops a command; the output is a fixed point of itself.

use tracing::debug;

use crate::core::token::{TokenParser, TrayFamily};
use crate::core::types::Command;

/// Canonicalises command text ahead of serialisation
pub struct CommandNormalizer<'a> {
    parser: &'a dyn TokenParser,
}

impl<'a> CommandNormalizer<'a> {
    pub fn new(parser: &'a dyn TokenParser) -> Self {
        Self { parser }
    }

    /// Normalises each command, keeping length and order
    pub fn normalize(&self, commands: &[Command]) -> Vec<String> {
        commands.iter().map(|cmd| self.normalize_command(cmd)).collect()
    }

    /// Canonical text for one command
    pub fn normalize_command(&self, command: &Command) -> String {
        let resolved = self.resolve(command);
        let Some(family) = resolved.signature.as_deref().and_then(TrayFamily::detect) else {
            return command.raw.clone();
        };

        render_tray_command(&resolved, family).unwrap_or_else(|| {
            debug!(raw = %command.raw, "tray command missing coordinates, leaving as is");
            command.raw.clone()
        })
    }

    /// Re-parses the raw text; falls back to the command as given
    fn resolve(&self, command: &Command) -> Command {
        match self.parser.parse_command_token(&command.raw) {
            Ok(parsed) if parsed.commands.len() == 1 => {
                let mut resolved = parsed.commands.into_iter().next().unwrap_or_default();
                if resolved.signature.is_none() {
                    resolved.signature = command.signature.clone();
                    resolved.parameters = command.parameters.clone();
                }
                resolved
            }
            Ok(_) => command.clone(),
            Err(e) => {
                debug!(raw = %command.raw, error = %e, "token parser rejected command");
                command.clone()
            }
        }
    }
}

/// Renders a tray command in canonical form
///
/// Returns `None` when the tray or slot coordinates are missing.
fn render_tray_command(command: &Command, family: TrayFamily) -> Option<String> {
    let command_type = command.base_name();
    let active = command.int_param("active").unwrap_or(1);
    let tray = command.int_param("tray")?;
    let slot = command.int_param("slot")?;

    let mut rendered = if active == 1 {
        format!("+{} {} {}", command_type, tray, slot)
    } else {
        format!("{} {} {} {}", command_type, active, tray, slot)
    };

    if family == TrayFamily::TrayWithBackup {
        let backup_tray = command.int_param("backup_tray")?;
        let backup_slot = command.int_param("backup_slot")?;
        rendered.push_str(&format!(" {} {}", backup_tray, backup_slot));
    }

    Some(rendered)
}
