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

//! Keybind file export with atomic writes and backup support.
//!
//! - **Rendering**: bindings and aliases become the exact text the game
//!   loads (`KEY "a $$ b"`, `alias NAME <& a $$ b &>`)
//! - **Atomic writes**: temp-file-then-rename, the target is never half written
//! - **Automatic backups**: an existing file is copied to `backups/` first
//! - **Validation gate**: error-severity issues block the write
//!
//! # Example
//!
//! ```no_run
//! use sto_keybind_manager::core::{ChainTokenParser, Command, KeyBinding};
//! use sto_keybind_manager::export::{render_keybind_file, ExportManager, ExportTransaction};
//! use std::path::PathBuf;
//!
//! let parser = ChainTokenParser::new();
//! let bindings = vec![KeyBinding::new("F1", vec![Command::new("FireAll")], false)];
//! let content = render_keybind_file(&bindings, &[], &parser);
//!
//! let manager = ExportManager::new(PathBuf::from("keybinds.txt"))?;
//! ExportTransaction::begin(&manager)?.commit(&content)?;
//! # Ok::<(), sto_keybind_manager::export::ExportError>(())
//! ```

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::chain::generate_preview_line;
use crate::core::normalizer::CommandNormalizer;
use crate::core::token::TokenParser;
use crate::core::types::{Alias, AliasCommands, KeyBinding};
use crate::validation::types::{alias_line, raw_alias_line};
use crate::validation::{ValidationContext, ValidationEngine, ValidationResult};

pub mod error;
pub mod transaction;

pub use error::ExportError;
pub use transaction::ExportTransaction;

/// Renders bindings and aliases as keybind file text
///
/// One line per binding (mirrored when stabilised), then one line per
/// alias. Aliases whose raw body cannot be split are written verbatim.
pub fn render_keybind_file(
    bindings: &[KeyBinding],
    aliases: &[Alias],
    parser: &dyn TokenParser,
) -> String {
    let mut lines: Vec<String> = bindings
        .iter()
        .map(|b| generate_preview_line(&b.key, &b.commands, b.stabilize, parser))
        .collect();

    let normalizer = CommandNormalizer::new(parser);
    for alias in aliases {
        let line = match alias.to_chain(parser) {
            Ok(chain) => alias_line(&alias.name, &normalizer.normalize(&chain)),
            Err(e) => {
                warn!(alias = %alias.name, error = %e, "alias body kept verbatim");
                match &alias.commands {
                    AliasCommands::Raw(raw) => raw_alias_line(&alias.name, raw),
                    AliasCommands::Chain(_) => continue,
                }
            }
        };
        lines.push(line);
    }

    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    content
}

/// Runs the engine over every binding and alias
///
/// Returns `(name, result)` pairs in export order. Aliases that fail to
/// split are checked against their verbatim line, which is what
/// [`render_keybind_file`] writes for them.
pub fn validate_profile(
    bindings: &[KeyBinding],
    aliases: &[Alias],
    engine: &ValidationEngine,
    parser: &dyn TokenParser,
) -> Vec<(String, ValidationResult)> {
    let keybind_results = bindings.iter().map(|b| {
        let context = ValidationContext::for_keybind(&b.key, &b.commands, b.stabilize, parser);
        (b.key.clone(), engine.validate(&context))
    });

    let alias_results = aliases.iter().filter_map(|a| {
        let context = match (a.to_chain(parser), &a.commands) {
            (Ok(chain), _) => ValidationContext::for_alias(&a.name, &chain, parser),
            (Err(e), AliasCommands::Raw(raw)) => {
                debug!(alias = %a.name, error = %e, "validating alias body verbatim");
                ValidationContext::for_raw_alias(&a.name, raw)
            }
            (Err(_), AliasCommands::Chain(_)) => return None,
        };
        Some((a.name.clone(), engine.validate(&context)))
    });

    keybind_results.chain(alias_results).collect()
}

/// Owns the export target and its backup directory.
#[derive(Debug)]
pub struct ExportManager {
    /// Keybind file written by transactions.
    target_path: PathBuf,
    backup_dir: PathBuf,
}

impl ExportManager {
    /// Creates a manager for `target_path`.
    ///
    /// The target does not have to exist yet. A `backups/` directory is
    /// created next to it.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::InvalidPath` if the path has no file name and
    /// `ExportError::BackupDirNotWritable` if the backup directory cannot
    /// be created or is read-only.
    pub fn new(target_path: PathBuf) -> Result<Self, ExportError> {
        if target_path.file_name().is_none() {
            return Err(ExportError::InvalidPath(target_path));
        }

        if target_path.read_link().is_ok() {
            warn!(path = %target_path.display(), "export target is a symlink");
        }

        // keybinds.txt has parent "" which means the working directory
        let parent = match target_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let backup_dir = parent.join("backups");

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ExportError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ExportError::BackupDirNotWritable(backup_dir));
        }

        Ok(Self {
            target_path,
            backup_dir,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Current content of the target, `None` if it does not exist
    pub fn read_existing(&self) -> Result<Option<String>, ExportError> {
        if !self.target_path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.target_path)?))
    }

    /// Copies the target into the backup directory
    ///
    /// Backups are named `<file>.<YYYY-MM-DD_HHMMSS>`; a numeric suffix is
    /// added when two backups land in the same second.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(path))` - Backup written
    /// * `Ok(None)` - Nothing to back up (target missing)
    pub fn create_timestamped_backup(&self) -> Result<Option<PathBuf>, ExportError> {
        let Some(content) = self.read_existing()? else {
            return Ok(None);
        };

        let original_name = self
            .target_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ExportError::InvalidPath(self.target_path.clone()))?;

        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");
        let base = format!("{}.{}", original_name, timestamp);

        let mut backup_path = self.backup_dir.join(&base);
        let mut attempt = 1;
        while backup_path.exists() {
            backup_path = self.backup_dir.join(format!("{}.{}", base, attempt));
            attempt += 1;
        }

        fs::write(&backup_path, &content)
            .map_err(|e| ExportError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        debug!(backup = %backup_path.display(), "backup created");
        Ok(Some(backup_path))
    }

    /// Backups of this target, oldest first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, ExportError> {
        let Some(original_name) = self.target_path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{}.", original_name);

        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect();
        backups.sort();
        Ok(backups)
    }
}

#[cfg(test)]
mod tests;
