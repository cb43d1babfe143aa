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

//! Export transactions with automatic backups
//!
//! Writes are atomic; the previous file is snapshotted before anything is
//! touched.

use atomic_write_file::AtomicWriteFile;
use std::{fs, io::Write, path::Path, path::PathBuf};
use tracing::{error, info, warn};

use crate::core::token::TokenParser;
use crate::core::types::{Alias, KeyBinding};
use crate::export::{render_keybind_file, validate_profile, ExportError, ExportManager};
use crate::validation::{Issue, ValidationEngine};

/// Atomic keybind file write with automatic backup.
///
/// # Lifecycle
///
/// 1. `begin()` - Backs up the existing file (if any)
/// 2. Caller renders the new content
/// 3. `commit()` writes atomically, or `rollback()` restores the original
///
/// # Example
///
/// ```no_run
/// use sto_keybind_manager::export::{ExportManager, ExportTransaction};
/// use std::path::PathBuf;
///
/// let manager = ExportManager::new(PathBuf::from("keybinds.txt"))?;
/// let tx = ExportTransaction::begin(&manager)?;
///
/// match tx.commit("F1 \"FireAll\"\n") {
///     Ok(()) => println!("Keybinds exported"),
///     Err(e) => eprintln!("Export failed: {}", e),
/// }
/// # Ok::<(), sto_keybind_manager::export::ExportError>(())
/// ```
pub struct ExportTransaction<'a> {
    manager: &'a ExportManager,
    backup_path: Option<PathBuf>,
}

impl<'a> ExportTransaction<'a> {
    /// Begins a transaction, backing up the current file first.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing file cannot be read or the backup
    /// cannot be written. Nothing has been modified in that case.
    pub fn begin(manager: &'a ExportManager) -> Result<Self, ExportError> {
        let backup_path = manager.create_timestamped_backup()?;

        Ok(Self {
            manager,
            backup_path,
        })
    }

    /// Backup taken by `begin()`, `None` when the target did not exist
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Validates every chain, then renders and commits.
    ///
    /// 1. Runs the engine over each binding and alias
    /// 2. Blocks on error-severity issues
    /// 3. Logs warnings but lets them through
    /// 4. Commits the rendered file
    ///
    /// # Returns
    ///
    /// * `Ok(warnings)` - File written; warnings that were allowed through
    /// * `Err(ExportError::ValidationFailed)` - Nothing written
    pub fn commit_with_validation(
        self,
        bindings: &[KeyBinding],
        aliases: &[Alias],
        engine: &ValidationEngine,
        parser: &dyn TokenParser,
    ) -> Result<Vec<Issue>, ExportError> {
        let results = validate_profile(bindings, aliases, engine, parser);

        let failed: Vec<&str> = results
            .iter()
            .filter(|(_, result)| result.has_errors())
            .map(|(name, _)| name.as_str())
            .collect();

        if !failed.is_empty() {
            for (name, result) in &results {
                for issue in &result.errors {
                    error!(chain = %name, rule = %issue.rule_id, key = %issue.message_key, "validation error");
                }
            }
            return Err(ExportError::ValidationFailed(format!(
                "{} chain(s) with errors: {}",
                failed.len(),
                failed.join(", ")
            )));
        }

        let warnings: Vec<Issue> = results
            .into_iter()
            .flat_map(|(_, result)| result.warnings)
            .collect();

        for issue in &warnings {
            warn!(rule = %issue.rule_id, key = %issue.message_key, "validation warning");
        }

        self.commit(&render_keybind_file(bindings, aliases, parser))?;
        Ok(warnings)
    }

    /// Atomically writes `new_content` to the target.
    ///
    /// Consumes the transaction. On failure the target is unchanged and the
    /// backup from `begin()` is still on disk.
    pub fn commit(self, new_content: &str) -> Result<(), ExportError> {
        write_atomic(&self.manager.target_path, new_content)?;
        info!(path = %self.manager.target_path.display(), "keybind file written");
        Ok(())
    }

    /// Restores the state captured by `begin()`.
    ///
    /// With a backup, its content is written back atomically. Without one
    /// the target did not exist, so any file created since is removed.
    pub fn rollback(&self) -> Result<(), ExportError> {
        match &self.backup_path {
            Some(backup_path) => {
                let backup_content = fs::read_to_string(backup_path)?;
                write_atomic(&self.manager.target_path, &backup_content)?;
            }
            None => {
                if self.manager.target_path.exists() {
                    fs::remove_file(&self.manager.target_path)?;
                }
            }
        }

        info!(path = %self.manager.target_path.display(), "export rolled back");
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<(), ExportError> {
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| ExportError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| ExportError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit()
        .map_err(|e| ExportError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}
