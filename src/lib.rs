// Copyright 2025 bakri (tidynest@proton.me)
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

//! Star Trek Online Keybind Manager
//!
//! Builds, validates and round-trips the command chains Star Trek Online
//! loads from keybind files (`KEY "cmd1 $$ cmd2"`) and alias definitions
//! (`alias NAME <& cmd1 $$ cmd2 &>`).
//!
//! # Features
//!
//! - **Normalisation:** Tray commands rewritten to their canonical form
//! - **Stabilisation:** Mirrored chains for deterministic execution order
//! - **Lenient Parsing:** Bad lines are reported, the rest still loads
//! - **Rule Engine:** Length, tray, environment and unsafe-key checks
//! - **Message Catalogs:** Translatable issue text with catalog audits
//! - **Atomic Export:** Timestamped backups before every write
//!
//! # Architecture
//!
//! - **`core`:** Chain codec (types, tokens, normaliser, mirror, parser, import)
//! - **`validation`:** Rule trait, built-in rules, engine and single-flight session
//! - **`i18n`:** JSON message catalogs and key diffs
//! - **`export`:** File rendering, backups and atomic writes
//!
//! # Examples
//!
//! ## Parsing a keybind file
//!
//! ```
//! use sto_keybind_manager::core::{import_file, ChainTokenParser};
//!
//! let parser = ChainTokenParser::new();
//! let content = "F1 \"FirePhasers $$ FireAll $$ FirePhasers\"\n";
//! let profile = import_file(content, &parser);
//!
//! assert_eq!(profile.keybinds.len(), 1);
//! assert!(profile.keybinds[0].stabilize);
//! assert_eq!(profile.keybinds[0].commands.len(), 2);
//! ```
//!
//! ## Previewing a chain
//!
//! ```
//! use sto_keybind_manager::core::{generate_preview_line, ChainTokenParser, Command};
//!
//! let parser = ChainTokenParser::new();
//! let commands = vec![Command::new("+STOTrayExecByTray 0 1"), Command::new("FireAll")];
//! let line = generate_preview_line("F2", &commands, false, &parser);
//!
//! assert_eq!(line, "F2 \"+STOTrayExecByTray 0 1 $$ FireAll\"");
//! ```

pub mod core;
pub mod export;
pub mod i18n;
pub mod validation;

// Re-export commonly used types for convenience
pub use core::{Alias, Command, KeyBinding, ParsedFile};
pub use validation::{ValidationEngine, ValidationResult, ValidationStatus};
