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

//! src/core/chain.rs
//!
//! Chain serialisation and mirroring
//!
//! A chain is exported as a single line the game loads verbatim:
//!
//! ```text
//! F1 "FirePhasers $$ FireAll $$ FirePhasers"
//! ```
//!
//! # Mirroring
//! The game advances through a bound chain one command per key press when
//! the chain is too long to run in one frame. Exporting the palindrome
//! `a b c b a` instead of `a b c` keeps the firing order stable no matter
//! where a repeated press lands. A mirrored chain of `n` commands has
//! `2n - 1` elements and its centre is the last original command.
//!
//! # Detection
//! `is_mirrored_tokens` is the detection used by the reference token
//! parser: an odd count of at least 3 trimmed tokens that reads the same in
//! both directions. `is_mirrored_line` and import both trust whatever the
//! token parser reports.

use crate::core::normalizer::CommandNormalizer;
use crate::core::token::TokenParser;
use crate::core::types::Command;

/// Chain delimiter as it appears in files
pub const CHAIN_DELIMITER: &str = "$$";

/// Delimiter used when joining a chain for export
pub const CHAIN_JOINER: &str = " $$ ";

/// Joins normalised commands into `KEY "cmd1 $$ cmd2"`
///
/// No escaping is performed; command text must not contain the delimiter
/// or a double quote.
pub fn serialize_line(key: &str, normalized: &[String]) -> String {
    if normalized.is_empty() {
        return format!("{} \"\"", key);
    }
    format!("{} \"{}\"", key, normalized.join(CHAIN_JOINER))
}

/// Builds the palindromic form of a chain
///
/// `[a, b, c]` → `[a, b, c, b, a]`. Chains of zero or one element are
/// returned unchanged.
pub fn mirror<T: Clone>(commands: &[T]) -> Vec<T> {
    if commands.len() <= 1 {
        return commands.to_vec();
    }

    let mut result = commands.to_vec();
    result.extend(commands[..commands.len() - 1].iter().rev().cloned());
    result
}

/// Recovers the original chain from its mirrored form
///
/// Inputs shorter than 3 or of even length cannot be mirrored and are
/// returned unchanged. Otherwise the first `len / 2 + 1` elements are kept.
pub fn unmirror<T: Clone>(commands: &[T]) -> Vec<T> {
    if commands.len() < 3 || commands.len() % 2 == 0 {
        return commands.to_vec();
    }

    let mid = commands.len() / 2;
    commands[..=mid].to_vec()
}

/// Splits a command string on `$$`, trimming each token
///
/// Empty tokens are kept so callers can report them.
pub fn split_command_string(command_string: &str) -> Vec<&str> {
    command_string.split(CHAIN_DELIMITER).map(str::trim).collect()
}

/// Palindrome test over an already split chain
pub fn is_mirrored_tokens<T: PartialEq>(tokens: &[T]) -> bool {
    let len = tokens.len();
    if len < 3 || len % 2 == 0 {
        return false;
    }
    (0..len / 2).all(|i| tokens[i] == tokens[len - 1 - i])
}

/// Tests whether a raw command string is a mirrored chain
///
/// Delegates to the token parser's structural verdict; a string the parser
/// rejects is not mirrored.
pub fn is_mirrored_line(command_string: &str, parser: &dyn TokenParser) -> bool {
    parser
        .parse_command_token(command_string)
        .map(|parsed| parsed.is_mirrored)
        .unwrap_or(false)
}

/// Number of characters in a rendered line
///
/// Counted in `char`s, which is what the game's line limit measures.
pub fn rendered_length(line: &str) -> usize {
    line.chars().count()
}

/// A fully rendered chain, ready for export or validation
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainPreview {
    /// Exported line (`KEY "..."`)
    pub line: String,
    /// Commands as they appear in the line (mirrored when stabilised)
    pub emitted: Vec<String>,
    /// Character length of `line`
    pub length: usize,
}

/// Normalises, optionally mirrors, then serialises a chain
pub fn build_preview(
    key: &str,
    commands: &[Command],
    stabilize: bool,
    parser: &dyn TokenParser,
) -> ChainPreview {
    let normalized = CommandNormalizer::new(parser).normalize(commands);
    let emitted = if stabilize && normalized.len() > 1 {
        mirror(&normalized)
    } else {
        normalized
    };

    let line = serialize_line(key, &emitted);
    let length = rendered_length(&line);
    ChainPreview {
        line,
        emitted,
        length,
    }
}

/// Exact line that would be written for `key`
pub fn generate_preview_line(
    key: &str,
    commands: &[Command],
    stabilize: bool,
    parser: &dyn TokenParser,
) -> String {
    build_preview(key, commands, stabilize, parser).line
}
