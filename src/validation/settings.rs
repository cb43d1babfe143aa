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

//! Rule thresholds
//!
//! Defaults match the game's keybind engine, which silently truncates
//! lines at roughly 999 characters. A settings file only needs to list
//! the values it overrides:
//!
//! ```toml
//! length_warning = 850
//! unsafe_keys = ["Alt+F4", "Ctrl+Alt+Delete"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default reserved keys the OS or game client intercepts
///
/// Windows shell shortcuts and the screenshot keys.
pub const DEFAULT_UNSAFE_KEYS: &[&str] = &[
    "Alt+F4",
    "Alt+Tab",
    "Alt+Esc",
    "Alt+Enter",
    "Ctrl+Esc",
    "Ctrl+Alt+Del",
    "Ctrl+Alt+Delete",
    "Ctrl+Shift+Esc",
    "LWin",
    "RWin",
    "Print",
    "PrintScreen",
    "SysRq",
];

/// Settings loading errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings file: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Length warning threshold {warning} must not exceed error threshold {error}")]
    InvalidThresholds { warning: usize, error: usize },

    #[error("IO error reading settings: {0}")]
    Io(#[from] std::io::Error),
}

/// Thresholds and lists used by the built-in rules
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Line length that starts producing a warning
    pub length_warning: usize,
    /// Line length that becomes an error
    pub length_error: usize,
    /// Most commands a single key may carry without a warning
    pub max_key_commands: usize,
    /// Key names that must not be bound (case-insensitive)
    pub unsafe_keys: Vec<String>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            length_warning: 900,
            length_error: 990,
            max_key_commands: 20,
            unsafe_keys: DEFAULT_UNSAFE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl RuleSettings {
    /// Parses settings from TOML, filling unspecified fields with defaults
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: RuleSettings = toml::from_str(content)?;
        settings.check()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.length_warning > self.length_error {
            return Err(SettingsError::InvalidThresholds {
                warning: self.length_warning,
                error: self.length_error,
            });
        }
        Ok(())
    }
}
