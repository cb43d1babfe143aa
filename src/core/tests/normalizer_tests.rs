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

use crate::core::{
    normalizer::CommandNormalizer,
    token::{ChainTokenParser, ParsedCommandString, TokenError, TokenParser, TRAY_EXEC_SIGNATURE},
    types::Command,
};

/// Token parser that rejects everything
struct FailingParser;

impl TokenParser for FailingParser {
    fn parse_command_token(&self, _raw: &str) -> Result<ParsedCommandString, TokenError> {
        Err(TokenError::EmptyCommand { position: 1 })
    }
}

fn normalize(raw: &[&str]) -> Vec<String> {
    let parser = ChainTokenParser::new();
    let commands: Vec<Command> = raw.iter().map(|r| Command::new(*r)).collect();
    CommandNormalizer::new(&parser).normalize(&commands)
}

#[test]
fn test_active_tray_uses_toggle_form() {
    assert_eq!(normalize(&["TrayExecByTray 1 2 3"]), vec!["+TrayExecByTray 2 3"]);
}

#[test]
fn test_inactive_tray_uses_explicit_form() {
    assert_eq!(normalize(&["TrayExecByTray 0 2 3"]), vec!["TrayExecByTray 0 2 3"]);
}

#[test]
fn test_toggle_form_defaults_active() {
    assert_eq!(normalize(&["+TrayExecByTray 2 3"]), vec!["+TrayExecByTray 2 3"]);
}

#[test]
fn test_sto_prefix_and_plus_are_kept_as_command_type() {
    assert_eq!(
        normalize(&["+STOTrayExecByTray 2 3", "STOTrayExecByTray 1 4 5"]),
        vec!["+STOTrayExecByTray 2 3", "+STOTrayExecByTray 4 5"]
    );
}

#[test]
fn test_backup_family_keeps_backup_slot() {
    assert_eq!(
        normalize(&["TrayExecByTrayWithBackup 1 0 1 2 3"]),
        vec!["+TrayExecByTrayWithBackup 0 1 2 3"]
    );
    assert_eq!(
        normalize(&["TrayExecByTrayWithBackup 0 0 1 2 3"]),
        vec!["TrayExecByTrayWithBackup 0 0 1 2 3"]
    );
}

#[test]
fn test_other_commands_pass_through() {
    assert_eq!(
        normalize(&["FirePhasers", "GenSendMessage HUD_Root Toggle"]),
        vec!["FirePhasers", "GenSendMessage HUD_Root Toggle"]
    );
}

#[test]
fn test_normalization_is_idempotent() {
    let once = normalize(&[
        "TrayExecByTray 1 2 3",
        "TrayExecByTray 0 2 3",
        "TrayExecByTrayWithBackup 1 0 1 2 3",
        "FireAll",
    ]);
    let as_refs: Vec<&str> = once.iter().map(String::as_str).collect();
    assert_eq!(normalize(&as_refs), once);
}

#[test]
fn test_parser_failure_is_fail_open() {
    let commands = vec![Command::new("TrayExecByTray 1 2 3"), Command::new("FireAll")];
    let normalized = CommandNormalizer::new(&FailingParser).normalize(&commands);
    assert_eq!(normalized, vec!["TrayExecByTray 1 2 3", "FireAll"]);
}

#[test]
fn test_preparsed_signature_used_when_parser_fails() {
    let command = Command::new("TrayExecByTray 1 2 3")
        .with_signature(TRAY_EXEC_SIGNATURE)
        .with_parameter("active", 0i64)
        .with_parameter("tray", 2i64)
        .with_parameter("slot", 3i64);

    let normalized = CommandNormalizer::new(&FailingParser).normalize_command(&command);
    assert_eq!(normalized, "TrayExecByTray 0 2 3");
}

#[test]
fn test_tray_signature_without_coordinates_falls_back() {
    let command = Command::new("TrayExecByTray").with_signature(TRAY_EXEC_SIGNATURE);
    let normalized = CommandNormalizer::new(&FailingParser).normalize_command(&command);
    assert_eq!(normalized, "TrayExecByTray");
}
