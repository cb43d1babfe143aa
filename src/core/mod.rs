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

//! src/core/mod.rs
//!
//! Command-chain codec
//!
//! This module contains the data structures and algorithms that turn
//! keybind files into command chains and back:
//! - Type definitions for commands, keybinds and aliases
//! - Command registry and token parser seams
//! - Tray-command normalisation
//! - Line serialisation and the mirror codec
//! - Keybind file parsing and import post-processing
//!
//! Nothing here performs I/O, so everything is unit tested without a
//! filesystem.

pub mod chain;
pub mod import;
pub mod normalizer;
pub mod parser;
pub mod registry;
pub mod token;
pub mod types;

pub use chain::{build_preview, generate_preview_line, mirror, serialize_line, unmirror, ChainPreview};
pub use import::{import_file, ImportedProfile};
pub use normalizer::CommandNormalizer;
pub use parser::parse_file;
pub use registry::{CommandMetadata, CommandRegistry, StaticRegistry};
pub use token::{ChainTokenParser, ParsedCommandString, TokenError, TokenParser};
pub use types::*;

#[cfg(test)]
mod tests;
