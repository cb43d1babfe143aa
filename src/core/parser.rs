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

//! src/core/parser.rs
//!
//! Keybind file parser
//!
//! This module parses exported keybind files into keybinds and aliases.
//! It handles:
//! - Keybind lines: `F1 "FirePhasers $$ FireAll"`
//! - Quoted aliases: `alias Attack "FirePhasers $$ FireTorps"`
//! - Bracket aliases: `alias Attack <& FirePhasers $$ FireTorps &>`
//! - `//` comments and blank lines
//! - Line numbers for error reporting
//!
//! # Architecture
//! Each line form is a small nom parser; `parse_file` tries them in order
//! (keybind, quoted alias, bracket alias) on every trimmed line. Parsing is
//! best-effort: a line nothing matches is recorded as a `ParseError` and
//! the remaining lines are still parsed.

use nom::{
    bytes::complete::{tag, take_till1, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::eof,
    IResult, Parser,
};
use tracing::debug;

use crate::core::token::TokenParser;
use crate::core::types::{ParseError, ParsedAlias, ParsedFile, ParsedKeybind};

/// Parse a complete keybind file
///
/// # Arguments
/// * `content` - The full file content
/// * `parser` - Token parser used to split keybind command strings
///
/// # Returns
/// Every keybind and alias that could be read, plus one `ParseError` per
/// line that could not.
///
/// # Example
/// ```ignore
/// let parsed = parse_file("F1 \"FireAll\"\n", &ChainTokenParser::new());
/// assert!(parsed.keybinds.contains_key("F1"));
/// ```
pub fn parse_file(content: &str, parser: &dyn TokenParser) -> ParsedFile {
    let mut parsed = ParsedFile::default();

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1; // Human-readable numbers start at 1

        // Skip empty lines and comments
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() || line_trimmed.starts_with("//") {
            continue;
        }

        if let Ok((_, (key, command_string))) = parse_keybind_line(line_trimmed) {
            match parser.parse_command_token(command_string) {
                Ok(structured) => {
                    parsed.keybinds.insert(
                        key.to_string(),
                        ParsedKeybind {
                            raw: command_string.to_string(),
                            commands: structured.commands,
                            is_mirrored: structured.is_mirrored,
                        },
                    );
                }
                Err(e) => {
                    debug!(line = line_num, error = %e, "failed to tokenise keybind");
                    parsed.errors.push(ParseError {
                        line: line_num,
                        message: format!("Failed to parse commands for {}: {}", key, e),
                    });
                }
            }
            continue;
        }

        if let Ok((_, (name, command_string))) =
            parse_alias_quoted(line_trimmed).or_else(|_| parse_alias_bracket(line_trimmed))
        {
            parsed.aliases.insert(
                name.to_string(),
                ParsedAlias {
                    commands: command_string.trim().to_string(),
                },
            );
            continue;
        }

        debug!(line = line_num, "unrecognised keybind line");
        parsed.errors.push(ParseError {
            line: line_num,
            message: format!("Unrecognized format: {}", line_trimmed),
        });
    }

    parsed
}

/// Parse a keybind line
///
/// Format: KEY "commandString"
/// Example: F1 "FirePhasers $$ FireAll"
///
/// Returns the key and the raw command string between the quotes.
pub fn parse_keybind_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, key) = take_till1(|c: char| c.is_whitespace()).parse(input)?;
    let (input, _) = multispace1.parse(input)?;
    let (input, command_string) = parse_quoted(input)?;
    let (input, _) = eof.parse(input)?;

    Ok((input, (key, command_string)))
}

/// Parse a quoted alias line
///
/// Format: alias NAME "commandString"
pub fn parse_alias_quoted(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, name) = parse_alias_head(input)?;
    let (input, command_string) = parse_quoted(input)?;
    let (input, _) = eof.parse(input)?;

    Ok((input, (name, command_string)))
}

/// Parse a bracket alias line
///
/// Format: alias NAME <& commandString &>
///
/// The command string runs to the last `&>` on the line, so it may itself
/// contain `&>`. It is returned trimmed.
pub fn parse_alias_bracket(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, name) = parse_alias_head(input)?;
    let (input, _) = tag("<&").parse(input)?;
    let (input, command_string) = parse_bracket_body(input)?;

    Ok((input, (name, command_string.trim())))
}

/// Everything up to a closing `&>` that ends the input
fn parse_bracket_body(input: &str) -> IResult<&str, &str> {
    match input.trim_end().strip_suffix("&>") {
        Some(body) => Ok(("", body)),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeUntil,
        ))),
    }
}

/// `alias` keyword, the alias name, and the whitespace after it
fn parse_alias_head(input: &str) -> IResult<&str, &str> {
    let (input, _) = (tag("alias"), multispace1).parse(input)?;
    let (input, name) = parse_word(input)?;
    let (input, _) = multispace1.parse(input)?;

    Ok((input, name))
}

/// Word-class identifier (letters, digits, underscore)
pub fn parse_word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_').parse(input)
}

/// `"..."` with no embedded quotes
fn parse_quoted(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('"').parse(input)?;
    let (input, content) = take_while(|c: char| c != '"').parse(input)?;
    let (input, _) = char('"').parse(input)?;

    Ok((input, content))
}
