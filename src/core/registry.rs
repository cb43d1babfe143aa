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

//! Command registry lookup
//!
//! The registry maps a command token to display metadata (category,
//! space/ground tag, human name, optional warning). The full command
//! database lives in the host application; this crate only consumes it
//! through the `CommandRegistry` trait.
//!
//! `StaticRegistry` is an in-memory implementation that can be built in
//! code or loaded from a TOML file:
//!
//! ```toml
//! [commands.FirePhasers]
//! name = "Fire Phasers"
//! category = "combat"
//! environment = "space"
//!
//! [commands.Target_Self]
//! name = "Target Self"
//! warning = "Clears your current target"
//! ```
//!
//! Lookups are case-insensitive. An exact match on the full command text
//! wins; otherwise the first word (without a leading `+`) is tried.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::types::Environment;

/// Metadata the registry knows about a command
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CommandMetadata {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub environment: Option<Environment>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Read-only command lookup
///
/// Implementations must be side-effect free. A miss is `None` and every
/// consumer treats it as "no effect".
pub trait CommandRegistry: Send + Sync {
    fn lookup_command_metadata(&self, token: &str) -> Option<CommandMetadata>;
}

/// Registry loading errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registry file: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("IO error reading registry: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    commands: HashMap<String, CommandMetadata>,
}

/// HashMap-backed registry
#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    /// Keys stored lowercase for case-insensitive lookup
    entries: HashMap<String, CommandMetadata>,
}

impl StaticRegistry {
    /// Creates an empty registry (every lookup misses)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(content)?;
        let mut registry = Self::new();
        for (command, metadata) in file.commands {
            registry.insert(&command, metadata);
        }
        Ok(registry)
    }

    /// Reads and parses a TOML registry file
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn insert(&mut self, command: &str, metadata: CommandMetadata) {
        self.entries.insert(command.trim().to_lowercase(), metadata);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CommandRegistry for StaticRegistry {
    fn lookup_command_metadata(&self, token: &str) -> Option<CommandMetadata> {
        let token = token.trim().to_lowercase();
        if let Some(found) = self.entries.get(&token) {
            return Some(found.clone());
        }

        let base = token.split_whitespace().next()?.trim_start_matches('+');
        self.entries.get(base).cloned()
    }
}
