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

//! Parser module tests
//!
//! Tests for parsing keybind files:
//! - Keybind line parsing
//! - Quoted and bracket alias parsing
//! - Comments and blank lines
//! - Per-line error collection

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::core::{parser::*, token::ChainTokenParser, types::ParseError};

/// In-memory log sink for a scoped tracing subscriber
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_parse_keybind_line() {
    let (_, (key, commands)) = parse_keybind_line("F1 \"FirePhasers $$ FireAll\"").unwrap();
    assert_eq!(key, "F1");
    assert_eq!(commands, "FirePhasers $$ FireAll");
}

#[test]
fn test_parse_keybind_line_empty_commands() {
    let (_, (key, commands)) = parse_keybind_line("Space \"\"").unwrap();
    assert_eq!(key, "Space");
    assert_eq!(commands, "");
}

#[test]
fn test_keybind_line_rejects_trailing_text() {
    assert!(parse_keybind_line("F1 \"FireAll\" extra").is_err());
    assert!(parse_keybind_line("F1 FireAll").is_err());
}

#[test]
fn test_alias_line_is_not_a_keybind() {
    assert!(parse_keybind_line("alias Attack \"FireAll\"").is_err());
}

#[test]
fn test_parse_alias_quoted() {
    let (_, (name, commands)) = parse_alias_quoted("alias Attack \"FirePhasers $$ FireTorps\"").unwrap();
    assert_eq!(name, "Attack");
    assert_eq!(commands, "FirePhasers $$ FireTorps");
}

#[test]
fn test_parse_alias_bracket() {
    let (_, (name, commands)) = parse_alias_bracket("alias Attack <&  FirePhasers $$ FireTorps  &>").unwrap();
    assert_eq!(name, "Attack");
    assert_eq!(commands, "FirePhasers $$ FireTorps");
}

#[test]
fn test_bracket_alias_body_runs_to_last_close() {
    let (_, (name, commands)) =
        parse_alias_bracket("alias Redirect <& say a&>b $$ FireAll &>").unwrap();
    assert_eq!(name, "Redirect");
    assert_eq!(commands, "say a&>b $$ FireAll");
}

#[test]
fn test_bracket_alias_needs_closing_marker_at_end() {
    assert!(parse_alias_bracket("alias Attack <& FireAll &> trailing").is_err());
    assert!(parse_alias_bracket("alias Attack <& FireAll").is_err());

    let (_, (_, commands)) = parse_alias_bracket("alias Empty <&&>").unwrap();
    assert_eq!(commands, "");
}

#[test]
fn test_bracket_alias_body_may_contain_quotes() {
    let parsed = parse_file(
        "alias Hail <& say \"hello there\" $$ FireAll &>",
        &ChainTokenParser::new(),
    );

    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.aliases["Hail"].commands, "say \"hello there\" $$ FireAll");
}

#[test]
fn test_alias_name_must_be_word() {
    assert!(parse_alias_quoted("alias Bad-Name \"FireAll\"").is_err());
}

#[test]
fn test_parse_word() {
    let (rest, word) = parse_word("sto_attack1 rest").unwrap();
    assert_eq!(word, "sto_attack1");
    assert_eq!(rest, " rest");
}

#[test]
fn test_parse_file_skips_comments_and_blanks() {
    let content = r#"
// Exported keybinds

F1 "FirePhasers $$ FireAll"
   // indented comment
alias Attack <& FireTorps &>
"#;
    let parsed = parse_file(content, &ChainTokenParser::new());

    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.keybinds.len(), 1);
    assert_eq!(parsed.aliases.len(), 1);

    let f1 = &parsed.keybinds["F1"];
    assert_eq!(f1.raw, "FirePhasers $$ FireAll");
    assert_eq!(f1.commands.len(), 2);
    assert_eq!(parsed.aliases["Attack"].commands, "FireTorps");
}

#[test]
fn test_parse_file_resilient_to_garbage() {
    let content = "F1 \"FirePhasers\"\nF2 \"FireTorps\"\nthis is not a keybind\nalias A \"FireAll\"\nalias B <& FireMines &>";
    let parsed = parse_file(content, &ChainTokenParser::new());

    assert_eq!(
        parsed.errors,
        vec![ParseError {
            line: 3,
            message: "Unrecognized format: this is not a keybind".to_string(),
        }]
    );
    assert_eq!(parsed.keybinds.len(), 2);
    assert_eq!(parsed.aliases.len(), 2);
}

#[test]
fn test_parse_file_reports_token_failure_and_continues() {
    let content = "F1 \"FireAll $$ $$ FirePhasers\"\nF2 \"FireTorps\"";
    let parsed = parse_file(content, &ChainTokenParser::new());

    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(parsed.errors[0].line, 1);
    assert!(parsed.errors[0].message.contains("F1"));
    assert!(!parsed.keybinds.contains_key("F1"));
    assert!(parsed.keybinds.contains_key("F2"));
}

#[test]
fn test_parse_file_last_write_wins() {
    let content = "F1 \"FireAll\"\nF1 \"FireTorps\"";
    let parsed = parse_file(content, &ChainTokenParser::new());

    assert_eq!(parsed.keybinds.len(), 1);
    assert_eq!(parsed.keybinds["F1"].raw, "FireTorps");
}

#[test]
fn test_parse_file_handles_crlf() {
    let content = "F1 \"FireAll\"\r\nF2 \"FireTorps\"\r\n";
    let parsed = parse_file(content, &ChainTokenParser::new());

    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.keybinds.len(), 2);
}

#[test]
fn test_bad_lines_are_not_logged_at_warn() {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_target(false)
        .with_writer(move || writer.clone())
        .finish();

    let parsed = tracing::subscriber::with_default(subscriber, || {
        let parsed = parse_file(
            "???\nF1 \"FireAll $$ $$ FirePhasers\"\n",
            &ChainTokenParser::new(),
        );
        tracing::warn!("parse finished");
        parsed
    });

    assert_eq!(parsed.errors.len(), 2);
    let text = log.text();
    assert!(text.contains("parse finished"));
    assert!(!text.contains("keybind"));
}
